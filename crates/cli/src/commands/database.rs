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

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use gantry_config::{ConfigurationSectionExt, DatabaseConfig};
use gantry_storage_pg::MIGRATOR;
use tracing::{info, info_span, Instrument};

use crate::util::database_connection_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Run database migrations
    Migrate,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let Subcommand::Migrate = self.subcommand;

        let span = info_span!("cli.database.migrate");
        let config = DatabaseConfig::extract_or_default(figment)
            .context("could not load the database configuration")?;

        async move {
            let mut conn = database_connection_from_config(&config).await?;

            // Run pending migrations
            MIGRATOR
                .run(&mut conn)
                .instrument(info_span!("db.migrate"))
                .await
                .context("could not run migrations")?;

            info!("Database is up to date");
            Ok(ExitCode::SUCCESS)
        }
        .instrument(span)
        .await
    }
}
