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

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of service a deployment runs, stored in the `"serviceType"`
/// database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Application,
    Postgres,
    Mysql,
    Mariadb,
    Mongo,
    Redis,
    Compose,
}

impl ServiceType {
    /// Every variant, in the order they are declared in the database enum
    pub const ALL: [Self; 7] = [
        Self::Application,
        Self::Postgres,
        Self::Mysql,
        Self::Mariadb,
        Self::Mongo,
        Self::Redis,
        Self::Compose,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
            Self::Mongo => "mongo",
            Self::Redis => "redis",
            Self::Compose => "compose",
        }
    }

    /// Whether this service is a managed database
    #[must_use]
    pub const fn is_database(&self) -> bool {
        matches!(
            self,
            Self::Postgres | Self::Mysql | Self::Mariadb | Self::Mongo | Self::Redis
        )
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ServiceType`]
#[derive(Debug, Error)]
#[error("invalid service type {0:?}")]
pub struct InvalidServiceTypeError(String);

impl FromStr for ServiceType {
    type Err = InvalidServiceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| InvalidServiceTypeError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_and_unknown() {
        assert_eq!(
            "application".parse::<ServiceType>().unwrap(),
            ServiceType::Application
        );
        assert_eq!("redis".parse::<ServiceType>().unwrap(), ServiceType::Redis);
        assert!("sqlite".parse::<ServiceType>().is_err());
    }

    #[test]
    fn databases_and_non_databases() {
        assert!(!ServiceType::Application.is_database());
        assert!(!ServiceType::Compose.is_database());
        assert!(ServiceType::Mongo.is_database());
    }

    #[test]
    fn serde_uses_the_database_labels() {
        for t in ServiceType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, serde_json::Value::String(t.as_str().to_owned()));
        }
    }
}
