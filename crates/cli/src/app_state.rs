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

use std::{convert::Infallible, time::Instant};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
};
use gantry_handlers::ErrorWrapper;
use gantry_storage::{BoxClock, BoxRepository, Repository, RepositoryError, SystemClock};
use gantry_storage_pg::{DatabaseError, PgRepository};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(input: &AppState) -> Self {
        input.pool.clone()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for BoxClock {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let clock = SystemClock::default();
        Ok(Box::new(clock))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for BoxRepository {
    type Rejection = ErrorWrapper<DatabaseError>;

    async fn from_request_parts(
        _parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let start = Instant::now();
        let repo = PgRepository::from_pool(&state.pool).await?;

        let duration = start.elapsed();
        tracing::trace!(
            db.acquire_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "Acquired a database connection"
        );

        Ok(repo.map_err(RepositoryError::from_error).boxed())
    }
}
