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

//! An implementation of the storage traits for a PostgreSQL database
//!
//! This backend uses [`sqlx`] to interact with the database. Queries are
//! checked at runtime, and every repository wraps a single mutable
//! [`sqlx::PgConnection`], usually borrowed from a transaction owned by
//! [`PgRepository`].
//!
//! # Adding a new repository
//!
//! 1. Define the repository trait in the `gantry-storage` crate
//! 2. Add a migration under `migrations/` if it needs new tables
//! 3. Implement the trait on a `Pg*Repository<'c>` struct holding a
//!    `&'c mut PgConnection`
//! 4. Expose it through the [`RepositoryAccess`] implementation of
//!    [`PgRepository`]
//!
//! Each query should be run with [`ExecuteExt::traced`] inside a
//! `#[tracing::instrument]` span declaring the `db.query.text` field, so that
//! the SQL shows up in the traces.
//!
//! [`RepositoryAccess`]: gantry_storage::RepositoryAccess

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use sqlx::migrate::Migrator;

pub mod site_settings;
pub mod user;

mod errors;
pub(crate) mod repository;
pub(crate) mod tracing;

pub use self::{
    errors::{DatabaseError, DatabaseInconsistencyError},
    repository::PgRepository,
    tracing::ExecuteExt,
};

/// Embedded migrations, allowing them to run on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

#[cfg(test)]
mod tests {
    use gantry_data_model::ServiceType;
    use sqlx::PgPool;

    /// The values of the `"serviceType"` database enum must stay in sync with
    /// [`ServiceType`]
    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_service_type_enum_matches(pool: PgPool) {
        let values: Vec<String> = sqlx::query_scalar(
            r#"SELECT unnest(enum_range(NULL::"serviceType"))::TEXT"#,
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let expected: Vec<String> = ServiceType::ALL
            .iter()
            .map(|t| t.as_str().to_owned())
            .collect();
        assert_eq!(values, expected);

        for value in &values {
            value.parse::<ServiceType>().unwrap();
        }
    }
}
