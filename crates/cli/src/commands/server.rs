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

use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use gantry_config::AppConfig;
use gantry_handlers::registration::init_status;
use gantry_storage::{Repository, RepositoryError};
use gantry_storage_pg::{PgRepository, MIGRATOR};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::watch,
    task::JoinSet,
};
use tracing::{info, info_span, warn, Instrument};

use crate::{
    app_state::AppState,
    server::{build_listeners, build_router},
    util::database_pool_from_config,
};

/// How long in-flight requests get to finish once a shutdown was requested
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug, Default)]
pub(super) struct Options {
    /// Automatically apply pending migrations
    #[arg(long)]
    migrate: bool,
}

/// Wait for SIGTERM or SIGINT
async fn shutdown_signal() -> anyhow::Result<&'static str> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    };

    Ok(name)
}

impl Options {
    #[allow(clippy::too_many_lines)]
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let span = info_span!("cli.run.init").entered();
        let config = AppConfig::extract(figment).context("could not load configuration")?;

        // Connect to the database
        info!("Connecting to the database");
        let pool = database_pool_from_config(&config.database).await?;

        if self.migrate {
            info!("Running pending migrations");
            MIGRATOR
                .run(&pool)
                .instrument(info_span!("db.migrate"))
                .await
                .context("could not run migrations")?;
        }

        // Store the initial value of the registration setting, unless an owner
        // already picked one
        let mut repo = PgRepository::from_pool(&pool)
            .await?
            .map_err(RepositoryError::from_error)
            .boxed();
        let initial = config.registration.initial_public_registration;
        let inserted = init_status(&mut repo.site_settings(), initial)
            .await
            .context("could not initialize the public registration setting")?;
        repo.save().await?;
        if inserted {
            info!(registration.enabled = initial, "Stored the initial public registration setting");
        }

        let state = AppState { pool };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut servers = JoinSet::new();

        for listener in config.http.listeners {
            let router = build_router(
                state.clone(),
                &listener.resources,
                listener.prefix.as_deref(),
                listener.name.as_deref(),
            );

            for socket in build_listeners(&listener.binds)? {
                match socket.local_addr() {
                    Ok(addr) => info!(
                        "Listening on http://{addr} with resources {resources:?}",
                        resources = &listener.resources
                    ),
                    Err(_) => {
                        warn!("Could not get local address for listener, something might be wrong!");
                    }
                }

                let mut shutdown_rx = shutdown_rx.clone();
                let server = axum::serve(socket, router.clone()).with_graceful_shutdown(async move {
                    let _ = shutdown_rx.wait_for(|stop| *stop).await;
                });
                servers.spawn(async move { server.await });
            }
        }

        span.exit();

        tokio::select! {
            signal = shutdown_signal() => {
                let signal = signal?;
                info!(signal, "Received shutdown signal, waiting for pending requests");
            }

            Some(res) = servers.join_next() => {
                // A server stopped on its own, which only happens on errors
                res?.context("server failed")?;
            }
        }

        shutdown_tx.send_replace(true);

        let drain = async {
            while let Some(res) = servers.join_next().await {
                res?.context("server failed")?;
            }
            anyhow::Ok(())
        };

        let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await;
        match drained {
            Ok(res) => res?,
            Err(_) => {
                warn!("Some connections did not close in time, exiting anyway");
                servers.abort_all();
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
