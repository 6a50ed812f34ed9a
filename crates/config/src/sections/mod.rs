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

mod database;
mod http;
mod registration;

pub use self::{
    database::{ConnectConfig as DatabaseConnectConfig, DatabaseConfig},
    http::{
        BindConfig as HttpBindConfig, HttpConfig, ListenerConfig as HttpListenerConfig,
        Resource as HttpResource,
    },
    registration::RegistrationConfig,
};
use crate::{ConfigurationSection, ConfigurationSectionExt};

/// Application configuration root
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// Configuration of the HTTP server
    #[serde(default)]
    pub http: HttpConfig,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Configuration related to public registration
    #[serde(default, skip_serializing_if = "RegistrationConfig::is_default")]
    pub registration: RegistrationConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(&self, figment: &figment::Figment) -> Result<(), figment::Error> {
        self.http.validate(figment)?;
        self.database.validate(figment)?;
        self.registration.validate(figment)?;

        Ok(())
    }
}

/// Partial configuration actually used by the server
#[allow(missing_docs)]
#[derive(Debug)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub registration: RegistrationConfig,
}

impl AppConfig {
    /// Extract every section the server needs, falling back to defaults for
    /// the missing ones
    ///
    /// # Errors
    ///
    /// Returns an error if any of the present sections is invalid
    pub fn extract(figment: &figment::Figment) -> Result<Self, figment::Error> {
        Ok(Self {
            http: HttpConfig::extract_or_default(figment)?,
            database: DatabaseConfig::extract_or_default(figment)?,
            registration: RegistrationConfig::extract_or_default(figment)?,
        })
    }
}
