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

//! Page-level guard for the settings pages
//!
//! This only keeps non-owners from landing on an owner-only page. The
//! setting itself is protected by the service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use gantry_storage::RepositoryError;
use serde::{Deserialize, Serialize};

use crate::{
    api::public_registration::PublicRegistrationStatus, call_context::CallContext, registration,
    response::ErrorResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl From<RepositoryError> for RouteError {
    fn from(value: RepositoryError) -> Self {
        Self::Internal(Box::new(value))
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        tracing::error!(
            error = &self as &dyn std::error::Error,
            "Failed to render the settings page"
        );
        let error = ErrorResponse::from_error(&self);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
    }
}

/// The state prefetched for the authentication settings page, keyed by query
///
/// A query which could not be prefetched is `null`, and the page loads it on
/// its own.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSettingsState {
    pub public_registration: Option<PublicRegistrationStatus>,
}

#[tracing::instrument(name = "handler.views.settings.authentication", skip_all, err)]
pub async fn authentication(
    CallContext { mut repo, user, .. }: CallContext,
) -> Result<Response, RouteError> {
    if registration::authorize_update(user.as_ref()).is_err() {
        repo.cancel().await?;
        return Ok(Redirect::permanent("/").into_response());
    }

    let public_registration = match registration::get_status(&mut repo.site_settings()).await {
        Ok(enabled) => Some(PublicRegistrationStatus::new(enabled)),
        Err(e) => {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                "Could not prefetch the public registration setting"
            );
            None
        }
    };
    repo.cancel().await?;

    let state = AuthenticationSettingsState {
        public_registration,
    };

    Ok(Json(state).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{header::LOCATION, Request, StatusCode};
    use gantry_data_model::Role;
    use sqlx::PgPool;

    use crate::test_utils::{setup, RequestBuilderExt, ResponseExt, TestState};

    const PATH: &str = "/settings/authentication";

    #[sqlx::test(migrator = "gantry_storage_pg::MIGRATOR")]
    async fn test_non_owners_are_redirected(pool: PgPool) {
        setup();
        let state = TestState::from_pool(pool).await.unwrap();

        let response = state.request(Request::get(PATH).empty()).await;
        response.assert_status(StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/");

        for (username, role) in [("bob", Role::Admin), ("charlie", Role::Member)] {
            let user = state.add_user(username, role).await;
            let token = state.session_token(&user).await;

            let response = state
                .request(Request::get(PATH).bearer(&token).empty())
                .await;
            response.assert_status(StatusCode::PERMANENT_REDIRECT);
            assert_eq!(response.headers()[LOCATION], "/");
        }
    }

    #[sqlx::test(migrator = "gantry_storage_pg::MIGRATOR")]
    async fn test_owner_gets_prefetched_state(pool: PgPool) {
        setup();
        let state = TestState::from_pool(pool).await.unwrap();
        let owner = state.add_user("alice", Role::Owner).await;
        let token = state.session_token(&owner).await;

        let mut repo = state.repository().await.unwrap();
        repo.site_settings()
            .set_public_registration(&state.clock, true)
            .await
            .unwrap();
        repo.save().await.unwrap();

        let response = state
            .request(Request::get(PATH).bearer(&token).empty())
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        insta::assert_json_snapshot!(body, @r###"
        {
          "publicRegistration": {
            "isPublicRegistrationEnabled": true
          }
        }
        "###);
    }

    #[sqlx::test(migrator = "gantry_storage_pg::MIGRATOR")]
    async fn test_prefetch_failure_renders_without_the_state(pool: PgPool) {
        setup();
        let state = TestState::from_pool(pool.clone()).await.unwrap();
        let owner = state.add_user("alice", Role::Owner).await;
        let token = state.session_token(&owner).await;

        // A value which is not a boolean can't be read back
        sqlx::query("INSERT INTO site_settings (key, value) VALUES ($1, '\"yes\"'::jsonb)")
            .bind("public_registration_enabled")
            .execute(&pool)
            .await
            .unwrap();

        let response = state
            .request(Request::get(PATH).bearer(&token).empty())
            .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        insta::assert_json_snapshot!(body, @r###"
        {
          "publicRegistration": null
        }
        "###);
    }
}
