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

use aide::OperationIo;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use gantry_data_model::{BrowserSession, User};
use gantry_storage::{BoxClock, BoxRepository, RepositoryError};
use headers::{authorization::Bearer, Authorization};

use crate::response::ErrorResponse;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// Couldn't get a database repository for this request
    #[error("The storage is unavailable")]
    StorageUnavailable(#[source] BoxError),

    /// A database operation failed while resolving the session
    #[error("Failed to resolve the session")]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        tracing::error!(
            error = &self as &dyn std::error::Error,
            "Failed to set up the request context"
        );

        let response = ErrorResponse::from_error(&self);
        let status = match self {
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(response)).into_response()
    }
}

async fn repository<S>(parts: &mut Parts, state: &S) -> Result<BoxRepository, Rejection>
where
    S: Send + Sync,
    BoxRepository: FromRequestParts<S>,
    <BoxRepository as FromRequestParts<S>>::Rejection: Into<BoxError>,
{
    BoxRepository::from_request_parts(parts, state)
        .await
        .map_err(Into::into)
        .map_err(Rejection::StorageUnavailable)
}

/// An extractor giving a fresh repository to routes which don't care about
/// the caller
#[derive(OperationIo)]
#[aide(input)]
pub struct Storage(pub BoxRepository);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Storage
where
    S: Send + Sync,
    BoxRepository: FromRequestParts<S>,
    <BoxRepository as FromRequestParts<S>>::Rejection: Into<BoxError>,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(repository(parts, state).await?))
    }
}

/// Find the session behind a bearer token, if it can still be used
///
/// Unknown tokens, finished sessions and locked users all resolve to `None`.
///
/// # Errors
///
/// Returns an error if the repository fails
pub(crate) async fn resolve_session(
    repo: &mut BoxRepository,
    token: &str,
) -> Result<Option<BrowserSession>, RepositoryError> {
    let Some(session) = repo.browser_session().find_by_token(token).await? else {
        tracing::debug!("Unknown session token");
        return Ok(None);
    };

    if !session.is_valid() {
        tracing::debug!(
            user_session.id = %session.id,
            user.id = %session.user.id,
            "Session is finished or its user is locked"
        );
        return Ok(None);
    }

    Ok(Some(session))
}

/// An extractor which resolves who is calling
///
/// The repository and the clock are loaded once here and handed over to the
/// route, so it doesn't have to open a second transaction. A request without
/// a usable session gets `None` for both the user and the session.
#[non_exhaustive]
#[derive(OperationIo)]
#[aide(input)]
pub struct CallContext {
    pub repo: BoxRepository,
    pub clock: BoxClock,
    pub user: Option<User>,
    pub session: Option<BrowserSession>,
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CallContext
where
    S: Send + Sync,
    BoxRepository: FromRequestParts<S>,
    BoxClock: FromRequestParts<S, Rejection = std::convert::Infallible>,
    <BoxRepository as FromRequestParts<S>>::Rejection: Into<BoxError>,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let clock = BoxClock::from_request_parts(parts, state).await;
        let clock = match clock {
            Ok(c) => c,
            Err(e) => match e {},
        };

        let mut repo = repository(parts, state).await?;

        // A missing or malformed header is the same as no session at all
        let token = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();

        let session = match token {
            Some(TypedHeader(Authorization(bearer))) => {
                resolve_session(&mut repo, bearer.token()).await?
            }
            None => None,
        };

        let user = session.as_ref().map(|session| session.user.clone());

        Ok(Self {
            repo,
            clock,
            user,
            session,
        })
    }
}
