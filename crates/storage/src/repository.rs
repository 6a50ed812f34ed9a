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

use futures_util::{future::BoxFuture, FutureExt, TryFutureExt};
use thiserror::Error;

use crate::{
    site_settings::SiteSettingsRepository,
    user::{BrowserSessionRepository, UserRepository},
    Clock,
};

/// A [`Repository`] gives access to all the repositories of a storage
/// backend, within a single transaction which ends with either
/// [`RepositoryTransaction::save`] or [`RepositoryTransaction::cancel`].
///
/// It is implemented for every type which implements both
/// [`RepositoryAccess`] and [`RepositoryTransaction`] with the same error
/// type.
pub trait Repository<E>:
    RepositoryAccess<Error = E> + RepositoryTransaction<Error = E> + Send
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Wrap the repository so that its errors get mapped with the given
    /// function
    fn map_err<Mapper>(self, mapper: Mapper) -> MapErr<Self, Mapper>
    where
        Self: Sized,
    {
        MapErr::new(self, mapper)
    }

    /// Box the repository, so that the concrete backend gets erased
    fn boxed(self) -> BoxRepository<E>
    where
        Self: Sync + Sized + 'static,
    {
        Box::new(self)
    }
}

impl<E, S> Repository<E> for S
where
    S: RepositoryAccess<Error = E> + RepositoryTransaction<Error = E> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
}

/// A type-erased [`Repository`]
pub type BoxRepository<E = RepositoryError> = Box<dyn Repository<E> + Send + Sync + 'static>;

/// A boxed [`Clock`]
pub type BoxClock = Box<dyn Clock + Send>;

/// The error type returned by a [`BoxRepository`]: any backend error, with
/// the concrete type erased
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RepositoryError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl RepositoryError {
    /// Wrap any error into a [`RepositoryError`]
    pub fn from_error<E>(value: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(value),
        }
    }
}

/// Ends the transaction a [`Repository`] runs in
pub trait RepositoryTransaction {
    /// The error type returned when committing or rolling back
    type Error;

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage backend failed to commit
    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// Rollback the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage backend failed to rollback
    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;
}

/// Accessors for each kind of repository a backend provides
pub trait RepositoryAccess: Send {
    /// The backend-specific error type used by each repository
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get a [`UserRepository`]
    fn user<'c>(&'c mut self) -> Box<dyn UserRepository<Error = Self::Error> + 'c>;

    /// Get a [`BrowserSessionRepository`]
    fn browser_session<'c>(
        &'c mut self,
    ) -> Box<dyn BrowserSessionRepository<Error = Self::Error> + 'c>;

    /// Get a [`SiteSettingsRepository`]
    fn site_settings<'c>(
        &'c mut self,
    ) -> Box<dyn SiteSettingsRepository<Error = Self::Error> + 'c>;
}

/// A wrapper which is used to map the error type of a repository to another
pub struct MapErr<R, F> {
    pub(crate) inner: R,
    pub(crate) mapper: F,
    _private: (),
}

impl<R, F> MapErr<R, F> {
    /// Create a new [`MapErr`] wrapper from an inner repository and a mapper
    /// function
    #[must_use]
    pub fn new(inner: R, mapper: F) -> Self {
        Self {
            inner,
            mapper,
            _private: (),
        }
    }
}

impl<R, F, E> RepositoryTransaction for MapErr<R, F>
where
    R: RepositoryTransaction,
    R::Error: 'static,
    F: FnMut(R::Error) -> E + Send + Sync + 'static,
    E: 'static,
{
    type Error = E;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let Self { inner, mapper, .. } = *self;
        Box::new(inner).save().map_err(mapper).boxed()
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let Self { inner, mapper, .. } = *self;
        Box::new(inner).cancel().map_err(mapper).boxed()
    }
}

impl<R, F, E> RepositoryAccess for MapErr<R, F>
where
    R: RepositoryAccess,
    F: FnMut(R::Error) -> E + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn user<'c>(&'c mut self) -> Box<dyn UserRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.user(), &mut self.mapper))
    }

    fn browser_session<'c>(
        &'c mut self,
    ) -> Box<dyn BrowserSessionRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.browser_session(), &mut self.mapper))
    }

    fn site_settings<'c>(
        &'c mut self,
    ) -> Box<dyn SiteSettingsRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.site_settings(), &mut self.mapper))
    }
}

/// Implements a repository trait for the [`MapErr`] wrapper and for
/// [`Box<R>`], given the list of its methods
#[macro_export]
macro_rules! repository_impl {
    ($repo_trait:ident:
        $(
            async fn $method:ident (
                &mut self
                $(, $arg:ident: $arg_ty:ty )*
                $(,)?
            ) -> Result<$ret_ty:ty, Self::Error>;
        )*
    ) => {
        #[::async_trait::async_trait]
        impl<R: ?Sized> $repo_trait for ::std::boxed::Box<R>
        where
            R: $repo_trait,
        {
            type Error = <R as $repo_trait>::Error;

            $(
                async fn $method (&mut self $(, $arg: $arg_ty)*) -> Result<$ret_ty, Self::Error> {
                    (**self).$method ( $($arg),* ).await
                }
            )*
        }

        #[::async_trait::async_trait]
        impl<R, F, E> $repo_trait for $crate::MapErr<R, F>
        where
            R: $repo_trait,
            F: FnMut(<R as $repo_trait>::Error) -> E + ::std::marker::Send + ::std::marker::Sync,
        {
            type Error = E;

            $(
                async fn $method (&mut self $(, $arg: $arg_ty)*) -> Result<$ret_ty, Self::Error> {
                    self.inner.$method ( $($arg),* ).await.map_err(&mut self.mapper)
                }
            )*
        }
    };
}
