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

//! Interactions with the storage backend
//!
//! This crate provides a set of traits that can be implemented to interact
//! with the storage backend. Those traits are called repositories and are
//! grouped by the type of data they manage.
//!
//! Each repository trait has an associated `Error` type. Backends erase their
//! own error into a [`RepositoryError`] when they get boxed into a
//! [`BoxRepository`], which is what the HTTP handlers and the CLI work with.
//!
//! # Defining a new repository
//!
//! 1. Define a new (async) repository trait, with the methods needed
//! 2. Write an implementation of this trait for each backend
//! 3. Implement the trait on [`MapErr`] and on `Box<R>` with the
//!    [`repository_impl!`] macro
//! 4. Add an accessor for it on [`RepositoryAccess`]

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub(crate) mod repository;
pub mod site_settings;
pub mod user;

pub use self::{
    clock::{Clock, SystemClock},
    repository::{
        BoxClock, BoxRepository, MapErr, Repository, RepositoryAccess, RepositoryError,
        RepositoryTransaction,
    },
};
