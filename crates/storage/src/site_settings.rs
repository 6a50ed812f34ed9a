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

//! Repository to interact with the platform-wide settings

use async_trait::async_trait;
use gantry_data_model::RegistrationSetting;

use crate::{repository_impl, Clock};

/// A [`SiteSettingsRepository`] reads and writes the singleton settings of
/// the platform
#[async_trait]
pub trait SiteSettingsRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Get the stored [`RegistrationSetting`]
    ///
    /// Returns `None` if the setting was never initialized
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn registration(&mut self) -> Result<Option<RegistrationSetting>, Self::Error>;

    /// Overwrite the public registration flag
    ///
    /// This is a full replace with last-write-wins semantics: the row is
    /// created if missing, and `updated_at` is set from the clock.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn set_public_registration(
        &mut self,
        clock: &dyn Clock,
        enabled: bool,
    ) -> Result<RegistrationSetting, Self::Error>;

    /// Store the initial public registration flag, unless a value already
    /// exists
    ///
    /// Returns `true` if the value was inserted
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn init_public_registration(&mut self, enabled: bool) -> Result<bool, Self::Error>;
}

repository_impl!(SiteSettingsRepository:
    async fn registration(&mut self) -> Result<Option<RegistrationSetting>, Self::Error>;
    async fn set_public_registration(
        &mut self,
        clock: &dyn Clock,
        enabled: bool,
    ) -> Result<RegistrationSetting, Self::Error>;
    async fn init_public_registration(&mut self, enabled: bool) -> Result<bool, Self::Error>;
);
