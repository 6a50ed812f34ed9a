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

use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
};

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, Request, Response, StatusCode},
};
use gantry_data_model::{BrowserSession, Role, User};
use gantry_storage::{clock::MockClock, BoxClock, BoxRepository, Repository, RepositoryError};
use gantry_storage_pg::{DatabaseError, PgRepository};
use headers::{Authorization, ContentType, HeaderMapExt};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use tower::ServiceExt;

use crate::ErrorWrapper;

pub(crate) fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

#[derive(Clone)]
pub(crate) struct TestState {
    pub pool: PgPool,
    pub clock: Arc<MockClock>,
    pub rng: Arc<Mutex<ChaChaRng>>,
}

impl TestState {
    /// Create a new test state from the given database pool
    pub async fn from_pool(pool: PgPool) -> Result<Self, anyhow::Error> {
        let clock = Arc::new(MockClock::default());
        let rng = Arc::new(Mutex::new(ChaChaRng::seed_from_u64(42)));

        Ok(Self { pool, clock, rng })
    }

    /// Run a request through the full application router
    pub async fn request(&self, request: Request<String>) -> Response<String> {
        let (_api, api_router) = crate::api_router();
        let app = crate::healthcheck_router()
            .merge(api_router)
            .merge(crate::human_router())
            .with_state(self.clone());

        // The router is infallible
        let response = app.oneshot(request.map(Body::from)).await.unwrap();

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = String::from_utf8(body.to_vec()).expect("Response body is not valid UTF-8");

        Response::from_parts(parts, body)
    }

    pub async fn repository(&self) -> Result<BoxRepository, RepositoryError> {
        let repo = PgRepository::from_pool(&self.pool)
            .await
            .map_err(RepositoryError::from_error)?;
        Ok(repo.map_err(RepositoryError::from_error).boxed())
    }

    /// Returns a new random number generator.
    ///
    /// # Panics
    ///
    /// Panics if the RNG is already locked.
    pub fn rng(&self) -> ChaChaRng {
        let mut parent_rng = self.rng.try_lock().expect("Failed to lock RNG");
        ChaChaRng::from_rng(&mut *parent_rng).expect("Failed to seed RNG")
    }

    /// Create a user with the given role
    pub async fn add_user(&self, username: &str, role: Role) -> User {
        let mut repo = self.repository().await.unwrap();
        let user = repo
            .user()
            .add(&mut self.rng(), &self.clock, username.to_owned(), role)
            .await
            .unwrap();
        repo.save().await.unwrap();
        user
    }

    /// Start a session for the given user, returning its bearer token
    pub async fn session_token(&self, user: &User) -> String {
        let mut rng = self.rng();
        let token = BrowserSession::generate_token(&mut rng);
        let mut repo = self.repository().await.unwrap();
        repo.browser_session()
            .add(&mut rng, &self.clock, user, token.clone())
            .await
            .unwrap();
        repo.save().await.unwrap();
        token
    }
}

impl FromRef<TestState> for PgPool {
    fn from_ref(input: &TestState) -> Self {
        input.pool.clone()
    }
}

#[async_trait]
impl FromRequestParts<TestState> for BoxClock {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &TestState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Box::new(state.clock.clone()))
    }
}

#[async_trait]
impl FromRequestParts<TestState> for BoxRepository {
    type Rejection = ErrorWrapper<DatabaseError>;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &TestState,
    ) -> Result<Self, Self::Rejection> {
        let repo = PgRepository::from_pool(&state.pool).await?;
        Ok(repo.map_err(RepositoryError::from_error).boxed())
    }
}

pub(crate) trait RequestBuilderExt {
    /// Builds the request with the given JSON value as body.
    fn json<T: Serialize>(self, body: T) -> Request<String>;

    /// Sets the request Authorization header to the given bearer token.
    fn bearer(self, token: &str) -> Self;

    /// Builds the request with an empty body.
    fn empty(self) -> Request<String>;
}

impl RequestBuilderExt for axum::http::request::Builder {
    fn json<T: Serialize>(mut self, body: T) -> Request<String> {
        self.headers_mut()
            .unwrap()
            .typed_insert(ContentType::json());

        self.body(serde_json::to_string(&body).unwrap()).unwrap()
    }

    fn bearer(mut self, token: &str) -> Self {
        self.headers_mut()
            .unwrap()
            .typed_insert(Authorization::bearer(token).unwrap());
        self
    }

    fn empty(self) -> Request<String> {
        self.body(String::new()).unwrap()
    }
}

pub(crate) trait ResponseExt {
    /// Asserts that the response has the given status code.
    ///
    /// # Panics
    ///
    /// Panics if the response has a different status code.
    fn assert_status(&self, status: StatusCode);

    /// Parse the response body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON for `T`.
    fn json<T: DeserializeOwned>(&self) -> T;
}

impl ResponseExt for Response<String> {
    #[track_caller]
    fn assert_status(&self, status: StatusCode) {
        assert_eq!(
            self.status(),
            status,
            "HTTP status code mismatch: got {}, expected {}. Body: {}",
            self.status(),
            status,
            self.body()
        );
    }

    #[track_caller]
    fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_str(self.body()).expect("Response body is not valid JSON")
    }
}
