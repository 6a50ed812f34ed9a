// Copyright 2024 The Gantry developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether public registration is open, as a two-state value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationState {
    Enabled,
    Disabled,
}

impl From<bool> for RegistrationState {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl std::fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => f.write_str("Enabled"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

/// The platform-wide setting gating self-service registration
///
/// The default value is disabled: an installation which never touched the
/// setting does not let strangers create accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistrationSetting {
    /// Whether unauthenticated users may create an account on their own
    pub public_registration_enabled: bool,

    /// When the value was last overwritten. `None` for the initial value.
    pub updated_at: Option<DateTime<Utc>>,
}

impl RegistrationSetting {
    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.public_registration_enabled.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_disabled() {
        let setting = RegistrationSetting::default();
        assert!(!setting.public_registration_enabled);
        assert_eq!(setting.state(), RegistrationState::Disabled);
        assert!(setting.updated_at.is_none());
    }

    #[test]
    fn state_follows_the_flag() {
        assert_eq!(RegistrationState::from(true), RegistrationState::Enabled);
        assert_eq!(RegistrationState::from(false), RegistrationState::Disabled);
        assert_eq!(RegistrationState::Enabled.to_string(), "Enabled");
        assert_eq!(RegistrationState::Disabled.to_string(), "Disabled");
    }
}
