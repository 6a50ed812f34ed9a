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

use async_trait::async_trait;
use gantry_data_model::{BrowserSession, User};
use rand_core::RngCore;

use crate::{repository_impl, Clock};

/// A [`BrowserSessionRepository`] helps interacting with [`BrowserSession`]
/// saved in the storage backend
#[async_trait]
pub trait BrowserSessionRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Find a [`BrowserSession`] by the bearer token it was issued with
    ///
    /// Finished sessions are returned too, it is up to the caller to check
    /// [`BrowserSession::is_valid`].
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn find_by_token(&mut self, token: &str) -> Result<Option<BrowserSession>, Self::Error>;

    /// Start a new [`BrowserSession`] for the given [`User`]
    ///
    /// # Parameters
    ///
    /// * `rng`: A random number generator to generate the session ID
    /// * `clock`: The clock used to generate timestamps
    /// * `user`: The [`User`] the session belongs to
    /// * `token`: The opaque bearer token identifying the session
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        user: &User,
        token: String,
    ) -> Result<BrowserSession, Self::Error>;

    /// Finish a [`BrowserSession`]
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn finish(
        &mut self,
        clock: &dyn Clock,
        session: BrowserSession,
    ) -> Result<BrowserSession, Self::Error>;
}

repository_impl!(BrowserSessionRepository:
    async fn find_by_token(&mut self, token: &str) -> Result<Option<BrowserSession>, Self::Error>;
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        user: &User,
        token: String,
    ) -> Result<BrowserSession, Self::Error>;
    async fn finish(
        &mut self,
        clock: &dyn Clock,
        session: BrowserSession,
    ) -> Result<BrowserSession, Self::Error>;
);
