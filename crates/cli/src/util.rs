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

use std::time::Duration;

use anyhow::Context;
use gantry_config::{DatabaseConfig, DatabaseConnectConfig};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgConnection, PgPool,
};
use tracing::log::LevelFilter;

fn database_connect_options_from_config(
    config: &DatabaseConfig,
) -> Result<PgConnectOptions, anyhow::Error> {
    let options = match &config.options {
        DatabaseConnectConfig::Uri { uri } => uri
            .parse()
            .context("could not parse database connection string")?,

        DatabaseConnectConfig::Options {
            host,
            port,
            socket,
            username,
            password,
            database,
        } => {
            let mut opts = PgConnectOptions::new().application_name("gantry");

            if let Some(host) = host.as_deref() {
                opts = opts.host(host);
            }

            if let Some(port) = *port {
                opts = opts.port(port);
            }

            if let Some(socket) = socket.as_deref() {
                opts = opts.socket(socket);
            }

            if let Some(username) = username.as_deref() {
                opts = opts.username(username);
            }

            if let Some(password) = password.as_deref() {
                opts = opts.password(password);
            }

            if let Some(database) = database.as_deref() {
                opts = opts.database(database);
            }

            opts
        }
    };

    let options = options
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(100));

    Ok(options)
}

/// Create a database connection pool from the configuration
///
/// The pool's acquire timeout is the configured connect timeout, so a request
/// never waits longer than that for a connection.
#[tracing::instrument(name = "db.connect", skip_all, err(Debug))]
pub async fn database_pool_from_config(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    let options = database_connect_options_from_config(config)?;
    PgPoolOptions::new()
        .max_connections(config.max_connections.into())
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(options)
        .await
        .context("could not connect to the database")
}

/// Create a single database connection from the configuration
#[tracing::instrument(name = "db.connect", skip_all, err(Debug))]
pub async fn database_connection_from_config(
    config: &DatabaseConfig,
) -> Result<PgConnection, anyhow::Error> {
    database_connect_options_from_config(config)?
        .connect()
        .await
        .context("could not connect to the database")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_options_are_applied() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "host": "db.internal",
            "port": 6543,
            "username": "gantry",
            "database": "settings",
        }))
        .unwrap();

        let options = database_connect_options_from_config(&config).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "gantry");
        assert_eq!(options.get_database(), Some("settings"));
        assert_eq!(options.get_application_name(), Some("gantry"));
    }

    #[test]
    fn invalid_uri_is_rejected() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "uri": "not a uri",
        }))
        .unwrap();

        assert!(database_connect_options_from_config(&config).is_err());
    }
}
