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

//! A module containing the PostgreSQL implementation of the user-related
//! repositories

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gantry_data_model::{Role, User};
use gantry_storage::{user::UserRepository, Clock};
use rand::RngCore;
use sqlx::PgConnection;
use ulid::Ulid;
use uuid::Uuid;

use crate::{tracing::ExecuteExt, DatabaseError, DatabaseInconsistencyError};

mod session;

#[cfg(test)]
mod tests;

pub use self::session::PgBrowserSessionRepository;

/// An implementation of [`UserRepository`] for a PostgreSQL connection
pub struct PgUserRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgUserRepository<'c> {
    /// Create a new [`PgUserRepository`] from an active PostgreSQL connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserLookup {
    user_id: Uuid,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
    locked_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserLookup> for User {
    type Error = DatabaseInconsistencyError;

    fn try_from(value: UserLookup) -> Result<Self, Self::Error> {
        let id = value.user_id.into();
        let role: Role = value.role.parse().map_err(|e| {
            DatabaseInconsistencyError::on("users")
                .column("role")
                .row(id)
                .source(e)
        })?;

        Ok(Self {
            id,
            username: value.username,
            role,
            created_at: value.created_at,
            locked_at: value.locked_at,
        })
    }
}

#[async_trait]
impl<'c> UserRepository for PgUserRepository<'c> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.user.lookup",
        skip_all,
        fields(
            db.query.text,
            user.id = %id,
        ),
        err,
    )]
    async fn lookup(&mut self, id: Ulid) -> Result<Option<User>, Self::Error> {
        let res: Option<UserLookup> = sqlx::query_as(
            r"
                SELECT user_id
                     , username
                     , role
                     , created_at
                     , locked_at
                FROM users
                WHERE user_id = $1
            ",
        )
        .bind(Uuid::from(id))
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(res) = res else { return Ok(None) };

        Ok(Some(res.try_into()?))
    }

    #[tracing::instrument(
        name = "db.user.find_by_username",
        skip_all,
        fields(
            db.query.text,
            user.username = username,
        ),
        err,
    )]
    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, Self::Error> {
        let res: Option<UserLookup> = sqlx::query_as(
            r"
                SELECT user_id
                     , username
                     , role
                     , created_at
                     , locked_at
                FROM users
                WHERE username = $1
            ",
        )
        .bind(username)
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(res) = res else { return Ok(None) };

        Ok(Some(res.try_into()?))
    }

    #[tracing::instrument(
        name = "db.user.add",
        skip_all,
        fields(
            db.query.text,
            user.username = username,
            user.role = %role,
            user.id,
        ),
        err,
    )]
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        username: String,
        role: Role,
    ) -> Result<User, Self::Error> {
        let created_at = clock.now();
        let id = Ulid::from_datetime_with_source(created_at.into(), rng);
        tracing::Span::current().record("user.id", tracing::field::display(id));

        sqlx::query(
            r"
                INSERT INTO users (user_id, username, role, created_at)
                VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(Uuid::from(id))
        .bind(&username)
        .bind(role.as_str())
        .bind(created_at)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        Ok(User {
            id,
            username,
            role,
            created_at,
            locked_at: None,
        })
    }

    #[tracing::instrument(
        name = "db.user.exists",
        skip_all,
        fields(
            db.query.text,
            user.username = username,
        ),
        err,
    )]
    async fn exists(&mut self, username: &str) -> Result<bool, Self::Error> {
        let exists: bool = sqlx::query_scalar(
            r"
                SELECT EXISTS(
                    SELECT 1 FROM users WHERE username = $1
                )
            ",
        )
        .bind(username)
        .traced()
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(
        name = "db.user.lock",
        skip_all,
        fields(
            db.query.text,
            %user.id,
        ),
        err,
    )]
    async fn lock(&mut self, clock: &dyn Clock, mut user: User) -> Result<User, Self::Error> {
        if user.locked_at.is_some() {
            return Ok(user);
        }

        let locked_at = clock.now();
        let res = sqlx::query(
            r"
                UPDATE users
                SET locked_at = $1
                WHERE user_id = $2
            ",
        )
        .bind(locked_at)
        .bind(Uuid::from(user.id))
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        user.locked_at = Some(locked_at);

        Ok(user)
    }
}
