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

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gantry_storage::RepositoryError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    call_context::{CallContext, Storage},
    registration::{self, RegistrationError},
    response::ErrorResponse,
};

#[derive(Debug, thiserror::Error, OperationIo)]
#[aide(output_with = "Json<ErrorResponse>")]
#[error(transparent)]
pub struct RouteError(#[from] RegistrationError);

impl From<RepositoryError> for RouteError {
    fn from(value: RepositoryError) -> Self {
        Self(RegistrationError::StorageUnavailable(value))
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let error = ErrorResponse::from_error(&self);
        let status = match self.0 {
            RegistrationError::Forbidden => StatusCode::FORBIDDEN,
            RegistrationError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(error)).into_response()
    }
}

/// # The public registration setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicRegistrationStatus {
    /// Whether unauthenticated visitors may create an account
    pub is_public_registration_enabled: bool,
}

impl PublicRegistrationStatus {
    pub fn new(enabled: bool) -> Self {
        Self {
            is_public_registration_enabled: enabled,
        }
    }
}

/// # JSON payload for the `PUT /api/settings/public-registration` endpoint
#[derive(Deserialize, JsonSchema)]
#[serde(rename = "SetPublicRegistrationRequest")]
pub struct Request {
    /// The new value of the setting
    enabled: bool,
}

fn storage_unavailable_example() -> ErrorResponse {
    let error = RouteError::from(RepositoryError::from_error(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    )));
    ErrorResponse::from_error(&error)
}

pub fn get_doc(operation: TransformOperation) -> TransformOperation {
    operation
        .id("getPublicRegistration")
        .summary("Get whether public registration is enabled")
        .description("This endpoint does not require authentication.")
        .tag("settings")
        .response_with::<200, Json<PublicRegistrationStatus>, _>(|t| {
            t.description("The current value of the setting")
                .example(PublicRegistrationStatus::new(false))
        })
        .response_with::<503, RouteError, _>(|t| {
            t.description("The settings storage is unavailable")
                .example(storage_unavailable_example())
        })
}

#[tracing::instrument(name = "handler.api.settings.public_registration.get", skip_all, err)]
pub async fn get(Storage(mut repo): Storage) -> Result<Json<PublicRegistrationStatus>, RouteError> {
    let enabled = registration::get_status(&mut repo.site_settings()).await?;
    Ok(Json(PublicRegistrationStatus::new(enabled)))
}

pub fn set_doc(operation: TransformOperation) -> TransformOperation {
    operation
        .id("setPublicRegistration")
        .summary("Enable or disable public registration")
        .description("Only the owner of the platform can change this setting. Existing sessions are not affected.")
        .tag("settings")
        .response_with::<200, Json<PublicRegistrationStatus>, _>(|t| {
            t.description("The setting was changed, the response holds the stored value")
                .example(PublicRegistrationStatus::new(true))
        })
        .response_with::<403, RouteError, _>(|t| {
            let response = ErrorResponse::from_error(&RouteError(RegistrationError::Forbidden));
            t.description("The caller is not the owner").example(response)
        })
        .response_with::<503, RouteError, _>(|t| {
            t.description("The settings storage is unavailable")
                .example(storage_unavailable_example())
        })
}

#[tracing::instrument(name = "handler.api.settings.public_registration.set", skip_all, err)]
pub async fn set(
    CallContext {
        mut repo,
        clock,
        user,
        ..
    }: CallContext,
    Json(params): Json<Request>,
) -> Result<Json<PublicRegistrationStatus>, RouteError> {
    registration::update_status(
        &mut repo.site_settings(),
        &clock,
        user.as_ref(),
        params.enabled,
    )
    .await?;

    // Read the value back before committing, so that the response reflects
    // what is stored and a failure leaves nothing behind
    let enabled = registration::get_status(&mut repo.site_settings()).await?;

    repo.save().await?;

    Ok(Json(PublicRegistrationStatus::new(enabled)))
}
