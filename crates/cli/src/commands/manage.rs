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
use clap::{Parser, ValueEnum};
use figment::Figment;
use gantry_config::{ConfigurationSectionExt, DatabaseConfig};
use gantry_data_model::{BrowserSession, RegistrationState, Role, User};
use gantry_handlers::registration::{get_status, update_status};
use gantry_storage::{BoxRepository, Repository, RepositoryError, SystemClock};
use gantry_storage_pg::PgRepository;
use rand::SeedableRng;
use sqlx::PgPool;
use tracing::{info, info_span, warn, Instrument};

use crate::util::database_pool_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Add a user
    AddUser {
        username: String,

        /// Role given to the user
        #[arg(long, default_value_t = Role::Member)]
        role: Role,
    },

    /// Open a session for a user and print its bearer token
    IssueSession { username: String },

    /// Lock a user, so that its sessions stop working
    LockUser { username: String },

    /// Read or change the public registration setting
    #[command(subcommand)]
    Registration(RegistrationCommand),
}

#[derive(Parser, Debug)]
enum RegistrationCommand {
    /// Print whether public registration is enabled
    Status,

    /// Enable or disable public registration, acting as the given owner
    Set {
        state: StateArg,

        /// Username of the owner making the change
        #[arg(long = "as", value_name = "USERNAME")]
        requester: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StateArg {
    Enabled,
    Disabled,
}

impl From<StateArg> for bool {
    fn from(value: StateArg) -> Self {
        matches!(value, StateArg::Enabled)
    }
}

async fn repository(pool: &PgPool) -> Result<BoxRepository, anyhow::Error> {
    let repo = PgRepository::from_pool(pool)
        .await
        .context("could not start a database transaction")?;
    Ok(repo.map_err(RepositoryError::from_error).boxed())
}

async fn find_user(repo: &mut BoxRepository, username: &str) -> anyhow::Result<User> {
    repo.user()
        .find_by_username(username)
        .await?
        .context("User not found")
}

impl Options {
    #[allow(clippy::too_many_lines)]
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        let clock = SystemClock::default();
        // XXX: we should disallow SeedableRng::from_entropy
        let mut rng = rand_chacha::ChaChaRng::from_entropy();

        let config = DatabaseConfig::extract_or_default(figment)
            .context("could not load the database configuration")?;
        let pool = database_pool_from_config(&config).await?;

        match self.subcommand {
            SC::AddUser { username, role } => {
                let span = info_span!(
                    "cli.manage.add_user",
                    user.username = %username,
                    user.role = %role,
                );
                async move {
                    let mut repo = repository(&pool).await?;

                    if repo.user().exists(&username).await? {
                        anyhow::bail!("User {username:?} already exists");
                    }

                    let user = repo.user().add(&mut rng, &clock, username, role).await?;
                    repo.save().await?;

                    info!(%user.id, %user.username, %user.role, "User added");
                    Ok(ExitCode::SUCCESS)
                }
                .instrument(span)
                .await
            }

            SC::IssueSession { username } => {
                let span = info_span!("cli.manage.issue_session", user.username = %username);
                async move {
                    let mut repo = repository(&pool).await?;
                    let user = find_user(&mut repo, &username).await?;

                    if !user.is_valid() {
                        anyhow::bail!("User {username:?} is locked");
                    }

                    let token = BrowserSession::generate_token(&mut rng);
                    let session = repo
                        .browser_session()
                        .add(&mut rng, &clock, &user, token.clone())
                        .await?;
                    repo.save().await?;

                    info!(%user.id, user_session.id = %session.id, "Session issued");
                    println!("{token}");
                    Ok(ExitCode::SUCCESS)
                }
                .instrument(span)
                .await
            }

            SC::LockUser { username } => {
                let span = info_span!("cli.manage.lock_user", user.username = %username);
                async move {
                    let mut repo = repository(&pool).await?;
                    let user = find_user(&mut repo, &username).await?;

                    let user = repo.user().lock(&clock, user).await?;
                    repo.save().await?;

                    info!(%user.id, "User locked");
                    Ok(ExitCode::SUCCESS)
                }
                .instrument(span)
                .await
            }

            SC::Registration(RegistrationCommand::Status) => {
                let span = info_span!("cli.manage.registration.status");
                async move {
                    let mut repo = repository(&pool).await?;
                    let enabled = get_status(&mut repo.site_settings()).await?;
                    repo.cancel().await?;

                    println!("{}", RegistrationState::from(enabled));
                    Ok(ExitCode::SUCCESS)
                }
                .instrument(span)
                .await
            }

            SC::Registration(RegistrationCommand::Set { state, requester }) => {
                let enabled: bool = state.into();
                let span = info_span!(
                    "cli.manage.registration.set",
                    registration.enabled = enabled,
                    user.username = %requester,
                );
                async move {
                    let mut repo = repository(&pool).await?;
                    let user = find_user(&mut repo, &requester).await?;

                    // A locked account acts like nobody at all
                    let requester = if user.is_valid() {
                        Some(user)
                    } else {
                        warn!(%user.id, "User is locked");
                        None
                    };

                    update_status(&mut repo.site_settings(), &clock, requester.as_ref(), enabled)
                        .await
                        .context("could not change the public registration setting")?;

                    // Read the value back before committing, so that a failure
                    // leaves the setting untouched
                    let enabled = get_status(&mut repo.site_settings()).await?;
                    repo.save().await?;

                    println!("{}", RegistrationState::from(enabled));
                    Ok(ExitCode::SUCCESS)
                }
                .instrument(span)
                .await
            }
        }
    }
}
