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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ConfigurationSection;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// Configuration section for the public registration setting
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RegistrationConfig {
    /// Whether public registration is open on a fresh installation.
    ///
    /// This is only applied when the setting was never stored. Once an owner
    /// changed it, the stored value always takes precedence. Defaults to
    /// `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub initial_public_registration: bool,
}

impl RegistrationConfig {
    /// Returns true if the configuration is the default one
    pub(crate) fn is_default(&self) -> bool {
        is_false(&self.initial_public_registration)
    }
}

impl ConfigurationSection for RegistrationConfig {
    const PATH: Option<&'static str> = Some("registration");
}
