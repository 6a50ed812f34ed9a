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

//! A module containing the PostgreSQL implementation of the
//! [`SiteSettingsRepository`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gantry_data_model::RegistrationSetting;
use gantry_storage::{site_settings::SiteSettingsRepository, Clock};
use sqlx::{types::Json, PgConnection};

use crate::{tracing::ExecuteExt, DatabaseError, DatabaseInconsistencyError};

/// The key under which the public registration flag is stored
const PUBLIC_REGISTRATION_KEY: &str = "public_registration_enabled";

/// An implementation of [`SiteSettingsRepository`] for a PostgreSQL
/// connection
pub struct PgSiteSettingsRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgSiteSettingsRepository<'c> {
    /// Create a new [`PgSiteSettingsRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct SettingLookup {
    value: serde_json::Value,
    updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl<'c> SiteSettingsRepository for PgSiteSettingsRepository<'c> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.site_settings.registration",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn registration(&mut self) -> Result<Option<RegistrationSetting>, Self::Error> {
        let res: Option<SettingLookup> = sqlx::query_as(
            r"
                SELECT value
                     , updated_at
                FROM site_settings
                WHERE key = $1
            ",
        )
        .bind(PUBLIC_REGISTRATION_KEY)
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(res) = res else { return Ok(None) };

        let public_registration_enabled = res.value.as_bool().ok_or_else(|| {
            DatabaseInconsistencyError::on("site_settings")
                .column("value")
                .row(PUBLIC_REGISTRATION_KEY)
        })?;

        Ok(Some(RegistrationSetting {
            public_registration_enabled,
            updated_at: res.updated_at,
        }))
    }

    #[tracing::instrument(
        name = "db.site_settings.set_public_registration",
        skip_all,
        fields(
            db.query.text,
            site_settings.public_registration = enabled,
        ),
        err,
    )]
    async fn set_public_registration(
        &mut self,
        clock: &dyn Clock,
        enabled: bool,
    ) -> Result<RegistrationSetting, Self::Error> {
        let updated_at = clock.now();

        // Concurrent writers are serialized on the row lock taken by the upsert
        let res = sqlx::query(
            r"
                INSERT INTO site_settings (key, value, updated_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value
                  , updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(PUBLIC_REGISTRATION_KEY)
        .bind(Json(enabled))
        .bind(updated_at)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        Ok(RegistrationSetting {
            public_registration_enabled: enabled,
            updated_at: Some(updated_at),
        })
    }

    #[tracing::instrument(
        name = "db.site_settings.init_public_registration",
        skip_all,
        fields(
            db.query.text,
            site_settings.public_registration = enabled,
        ),
        err,
    )]
    async fn init_public_registration(&mut self, enabled: bool) -> Result<bool, Self::Error> {
        let res = sqlx::query(
            r"
                INSERT INTO site_settings (key, value, updated_at)
                VALUES ($1, $2, NULL)
                ON CONFLICT (key) DO NOTHING
            ",
        )
        .bind(PUBLIC_REGISTRATION_KEY)
        .bind(Json(enabled))
        .traced()
        .execute(&mut *self.conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use gantry_storage::{clock::MockClock, Clock, Repository, RepositoryAccess};
    use sqlx::PgPool;

    use crate::PgRepository;

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_registration_defaults_to_absent(pool: PgPool) {
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();

        assert!(repo.site_settings().registration().await.unwrap().is_none());
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_init_only_inserts_once(pool: PgPool) {
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let clock = MockClock::default();

        assert!(repo
            .site_settings()
            .init_public_registration(true)
            .await
            .unwrap());

        let setting = repo.site_settings().registration().await.unwrap().unwrap();
        assert!(setting.public_registration_enabled);
        assert!(setting.updated_at.is_none());

        // A second init must not overwrite the stored value
        assert!(!repo
            .site_settings()
            .init_public_registration(false)
            .await
            .unwrap());
        let setting = repo.site_settings().registration().await.unwrap().unwrap();
        assert!(setting.public_registration_enabled);

        // Neither after an explicit write
        repo.site_settings()
            .set_public_registration(&clock, false)
            .await
            .unwrap();
        assert!(!repo
            .site_settings()
            .init_public_registration(true)
            .await
            .unwrap());
        let setting = repo.site_settings().registration().await.unwrap().unwrap();
        assert!(!setting.public_registration_enabled);

        repo.save().await.unwrap();
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_set_public_registration(pool: PgPool) {
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let clock = MockClock::default();

        // Works without a prior init
        let setting = repo
            .site_settings()
            .set_public_registration(&clock, true)
            .await
            .unwrap();
        assert!(setting.public_registration_enabled);
        assert_eq!(setting.updated_at, Some(clock.now()));
        repo.save().await.unwrap();

        // The value is visible from another transaction
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let setting = repo.site_settings().registration().await.unwrap().unwrap();
        assert!(setting.public_registration_enabled);
        assert_eq!(setting.updated_at, Some(clock.now()));

        // Writing the same value twice is fine
        clock.advance(chrono::Duration::minutes(5));
        repo.site_settings()
            .set_public_registration(&clock, true)
            .await
            .unwrap();
        let setting = repo.site_settings().registration().await.unwrap().unwrap();
        assert!(setting.public_registration_enabled);
        assert_eq!(setting.updated_at, Some(clock.now()));

        repo.site_settings()
            .set_public_registration(&clock, false)
            .await
            .unwrap();
        let setting = repo.site_settings().registration().await.unwrap().unwrap();
        assert!(!setting.public_registration_enabled);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_cancelled_write_is_not_visible(pool: PgPool) {
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let clock = MockClock::default();

        repo.site_settings()
            .set_public_registration(&clock, true)
            .await
            .unwrap();
        repo.cancel().await.unwrap();

        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        assert!(repo.site_settings().registration().await.unwrap().is_none());
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_concurrent_writes_end_in_one_state(pool: PgPool) {
        let clock = MockClock::default();
        let mut first = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let mut second = PgRepository::from_pool(&pool).await.unwrap().boxed();

        let (a, b) = tokio::join!(
            async {
                first
                    .site_settings()
                    .set_public_registration(&clock, true)
                    .await?;
                first.save().await
            },
            async {
                second
                    .site_settings()
                    .set_public_registration(&clock, false)
                    .await?;
                second.save().await
            },
        );
        a.unwrap();
        b.unwrap();

        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        // Last write wins, whichever it was, and the row is never duplicated
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM site_settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(repo.site_settings().registration().await.unwrap().is_some());
    }
}
