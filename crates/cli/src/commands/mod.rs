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

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};

mod config;
mod database;
mod manage;
mod server;

#[derive(Parser, Debug)]
enum Subcommand {
    /// Configuration-related commands
    Config(self::config::Options),

    /// Manage the database
    Database(self::database::Options),

    /// Runs the web server
    Server(self::server::Options),

    /// Manage the instance
    Manage(self::manage::Options),
}

#[derive(Parser, Debug)]
#[command(version)]
pub struct Options {
    /// Path to the configuration file
    #[arg(short, long, global = true, action = clap::ArgAction::Append)]
    config: Vec<Utf8PathBuf>,

    #[command(subcommand)]
    subcommand: Option<Subcommand>,
}

impl Options {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        use Subcommand as S;
        // We Box the futures for each subcommand so that we avoid this function being
        // big on the stack all the time
        let figment = self.figment();
        match self.subcommand {
            Some(S::Config(c)) => Box::pin(c.run(&figment)).await,
            Some(S::Database(c)) => Box::pin(c.run(&figment)).await,
            Some(S::Server(c)) => Box::pin(c.run(&figment)).await,
            Some(S::Manage(c)) => Box::pin(c.run(&figment)).await,
            None => Box::pin(self::server::Options::default().run(&figment)).await,
        }
    }

    /// Get a [`Figment`] instance with the configuration loaded
    ///
    /// Files are merged in the order they were given, then the `GANTRY_`
    /// environment variables are layered on top, with `__` separating nested
    /// sections.
    pub fn figment(&self) -> Figment {
        let configs = if self.config.is_empty() {
            // Read the GANTRY_CONFIG environment variable
            std::env::var("GANTRY_CONFIG")
                // Default to "config.yaml"
                .unwrap_or_else(|_| "config.yaml".to_owned())
                // Split the file list on `:`
                .split(':')
                .map(Utf8PathBuf::from)
                .collect()
        } else {
            self.config.clone()
        };

        configs
            .into_iter()
            .fold(Figment::new(), |f, path| f.merge(Yaml::file(path)))
            .merge(Env::prefixed("GANTRY_").split("__").ignore(&["config"]))
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn later_files_and_env_take_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "base.yaml",
                r"
                    registration:
                      initial_public_registration: true
                    database:
                      uri: postgresql://base
                ",
            )?;
            jail.create_file(
                "override.yaml",
                r"
                    database:
                      uri: postgresql://override
                ",
            )?;
            jail.set_env("GANTRY_DATABASE__MAX_CONNECTIONS", "3");

            let options =
                Options::try_parse_from(["gantry", "-c", "base.yaml", "-c", "override.yaml"])
                    .map_err(|e| e.to_string())?;
            let config = gantry_config::AppConfig::extract(&options.figment())?;

            assert!(config.registration.initial_public_registration);
            assert_eq!(
                config.database.options,
                gantry_config::DatabaseConnectConfig::Uri {
                    uri: "postgresql://override".to_owned()
                }
            );
            assert_eq!(config.database.max_connections.get(), 3);

            Ok(())
        });
    }

    #[test]
    fn config_env_variable_lists_files() {
        Jail::expect_with(|jail| {
            jail.create_file("a.yaml", "registration:\n  initial_public_registration: true\n")?;
            jail.set_env("GANTRY_CONFIG", "a.yaml:missing.yaml");

            let options = Options::try_parse_from(["gantry", "config", "check"])
                .map_err(|e| e.to_string())?;
            let config = gantry_config::AppConfig::extract(&options.figment())?;
            assert!(config.registration.initial_public_registration);

            Ok(())
        });
    }
}
