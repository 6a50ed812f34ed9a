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
use chrono::{DateTime, Utc};
use gantry_data_model::{BrowserSession, User};
use gantry_storage::{user::BrowserSessionRepository, Clock};
use rand::RngCore;
use sqlx::PgConnection;
use ulid::Ulid;
use uuid::Uuid;

use crate::{tracing::ExecuteExt, DatabaseError, DatabaseInconsistencyError};

/// An implementation of [`BrowserSessionRepository`] for a PostgreSQL
/// connection
pub struct PgBrowserSessionRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgBrowserSessionRepository<'c> {
    /// Create a new [`PgBrowserSessionRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct SessionLookup {
    user_session_id: Uuid,
    user_session_created_at: DateTime<Utc>,
    user_session_finished_at: Option<DateTime<Utc>>,
    user_id: Uuid,
    user_username: String,
    user_role: String,
    user_created_at: DateTime<Utc>,
    user_locked_at: Option<DateTime<Utc>>,
}

impl TryFrom<SessionLookup> for BrowserSession {
    type Error = DatabaseInconsistencyError;

    fn try_from(value: SessionLookup) -> Result<Self, Self::Error> {
        let id = Ulid::from(value.user_id);
        let role = value.user_role.parse().map_err(|e| {
            DatabaseInconsistencyError::on("users")
                .column("role")
                .row(id)
                .source(e)
        })?;

        let user = User {
            id,
            username: value.user_username,
            role,
            created_at: value.user_created_at,
            locked_at: value.user_locked_at,
        };

        Ok(BrowserSession {
            id: value.user_session_id.into(),
            user,
            created_at: value.user_session_created_at,
            finished_at: value.user_session_finished_at,
        })
    }
}

#[async_trait]
impl<'c> BrowserSessionRepository for PgBrowserSessionRepository<'c> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.browser_session.find_by_token",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn find_by_token(&mut self, token: &str) -> Result<Option<BrowserSession>, Self::Error> {
        let res: Option<SessionLookup> = sqlx::query_as(
            r"
                SELECT s.user_session_id
                     , s.created_at            AS user_session_created_at
                     , s.finished_at           AS user_session_finished_at
                     , u.user_id
                     , u.username              AS user_username
                     , u.role                  AS user_role
                     , u.created_at            AS user_created_at
                     , u.locked_at             AS user_locked_at
                FROM user_sessions s
                INNER JOIN users u
                  USING (user_id)
                WHERE s.token = $1
            ",
        )
        .bind(token)
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(res) = res else { return Ok(None) };

        Ok(Some(res.try_into()?))
    }

    #[tracing::instrument(
        name = "db.browser_session.add",
        skip_all,
        fields(
            db.query.text,
            %user.id,
            user_session.id,
        ),
        err,
    )]
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        user: &User,
        token: String,
    ) -> Result<BrowserSession, Self::Error> {
        let created_at = clock.now();
        let id = Ulid::from_datetime_with_source(created_at.into(), rng);
        tracing::Span::current().record("user_session.id", tracing::field::display(id));

        sqlx::query(
            r"
                INSERT INTO user_sessions (user_session_id, user_id, token, created_at)
                VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(Uuid::from(id))
        .bind(Uuid::from(user.id))
        .bind(token)
        .bind(created_at)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        Ok(BrowserSession {
            id,
            user: user.clone(),
            created_at,
            finished_at: None,
        })
    }

    #[tracing::instrument(
        name = "db.browser_session.finish",
        skip_all,
        fields(
            db.query.text,
            %user_session.id,
        ),
        err,
    )]
    async fn finish(
        &mut self,
        clock: &dyn Clock,
        mut user_session: BrowserSession,
    ) -> Result<BrowserSession, Self::Error> {
        let finished_at = clock.now();
        let res = sqlx::query(
            r"
                UPDATE user_sessions
                SET finished_at = $1
                WHERE user_session_id = $2
            ",
        )
        .bind(finished_at)
        .bind(Uuid::from(user_session.id))
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        user_session.finished_at = Some(finished_at);

        Ok(user_session)
    }
}
