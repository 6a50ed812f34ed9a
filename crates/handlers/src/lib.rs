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

//! HTTP handlers of the Gantry dashboard backend, and the service owning the
//! public registration setting

#![deny(clippy::future_not_send)]
#![allow(
    // Some axum handlers need that
    clippy::unused_async,
    // Because of how axum handlers work, we sometime have take many arguments
    clippy::too_many_arguments,
    // Code generated by tracing::instrument trigger this when returning an `impl Trait`
    // See https://github.com/tokio-rs/tracing/issues/2613
    clippy::let_with_type_underscore,
)]

use axum::{
    extract::{FromRef, FromRequestParts},
    routing::get,
    Router,
};
use sqlx::PgPool;

mod api;
mod call_context;
mod error_wrapper;
mod health;
pub mod registration;
mod response;
mod views;

#[cfg(test)]
mod test_utils;

pub use aide::openapi::OpenApi;

pub use self::{
    api::public_registration::PublicRegistrationStatus,
    call_context::{CallContext, Storage},
    error_wrapper::ErrorWrapper,
};

pub fn healthcheck_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    PgPool: FromRef<S>,
{
    Router::new().route("/health", get(self::health::get))
}

/// The settings API, with its OpenAPI document served under `/api/spec.json`
pub fn api_router<S>() -> (OpenApi, Router<S>)
where
    S: Clone + Send + Sync + 'static,
    CallContext: FromRequestParts<S>,
    Storage: FromRequestParts<S>,
{
    self::api::router()
}

/// Pages destined to be viewed by humans, which are only guarded here
pub fn human_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    CallContext: FromRequestParts<S>,
{
    Router::new().route(
        "/settings/authentication",
        get(self::views::authentication_settings),
    )
}
