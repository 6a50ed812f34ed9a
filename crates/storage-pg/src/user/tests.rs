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

use chrono::Duration;
use gantry_data_model::{BrowserSession, Role};
use gantry_storage::{clock::MockClock, Clock, Repository, RepositoryAccess};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use sqlx::PgPool;

use crate::PgRepository;

/// Test the user repository, by adding, looking up and locking a user
#[sqlx::test(migrator = "crate::MIGRATOR")]
async fn test_user_repo(pool: PgPool) {
    const USERNAME: &str = "john";

    let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
    let mut rng = ChaChaRng::seed_from_u64(42);
    let clock = MockClock::default();

    // Initially, the user shouldn't exist
    assert!(!repo.user().exists(USERNAME).await.unwrap());
    assert!(repo
        .user()
        .find_by_username(USERNAME)
        .await
        .unwrap()
        .is_none());

    let user = repo
        .user()
        .add(&mut rng, &clock, USERNAME.to_owned(), Role::Admin)
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(!user.is_owner());

    // And now it should exist
    assert!(repo.user().exists(USERNAME).await.unwrap());
    let found = repo
        .user()
        .find_by_username(USERNAME)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, user);
    assert_eq!(repo.user().lookup(user.id).await.unwrap(), Some(user.clone()));

    // Adding a second time should give a conflict
    assert!(repo
        .user()
        .add(&mut rng, &clock, USERNAME.to_owned(), Role::Member)
        .await
        .is_err());

    repo.cancel().await.unwrap();
}

#[sqlx::test(migrator = "crate::MIGRATOR")]
async fn test_user_lock(pool: PgPool) {
    let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
    let mut rng = ChaChaRng::seed_from_u64(42);
    let clock = MockClock::default();

    let user = repo
        .user()
        .add(&mut rng, &clock, "alice".to_owned(), Role::Owner)
        .await
        .unwrap();
    assert!(user.is_valid());

    let user = repo.user().lock(&clock, user).await.unwrap();
    assert!(!user.is_valid());
    let locked_at = user.locked_at;

    // Check that the property is retrieved on lookup
    let user = repo.user().lookup(user.id).await.unwrap().unwrap();
    assert!(!user.is_valid());
    assert_eq!(user.locked_at, locked_at);

    // Locking a second time keeps the original timestamp
    clock.advance(Duration::minutes(1));
    let user = repo.user().lock(&clock, user).await.unwrap();
    assert_eq!(user.locked_at, locked_at);

    repo.save().await.unwrap();
}

#[sqlx::test(migrator = "crate::MIGRATOR")]
async fn test_browser_session(pool: PgPool) {
    let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
    let mut rng = ChaChaRng::seed_from_u64(42);
    let clock = MockClock::default();

    let user = repo
        .user()
        .add(&mut rng, &clock, "alice".to_owned(), Role::Owner)
        .await
        .unwrap();

    let token = BrowserSession::generate_token(&mut rng);
    assert!(repo
        .browser_session()
        .find_by_token(&token)
        .await
        .unwrap()
        .is_none());

    let session = repo
        .browser_session()
        .add(&mut rng, &clock, &user, token.clone())
        .await
        .unwrap();
    assert!(session.is_valid());
    assert_eq!(session.user, user);

    let found = repo
        .browser_session()
        .find_by_token(&token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, session);

    // Tokens are unique
    assert!(repo
        .browser_session()
        .add(&mut rng, &clock, &user, token.clone())
        .await
        .is_err());

    repo.cancel().await.unwrap();
    let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();

    let user = repo
        .user()
        .add(&mut rng, &clock, "bob".to_owned(), Role::Member)
        .await
        .unwrap();
    let session = repo
        .browser_session()
        .add(&mut rng, &clock, &user, token.clone())
        .await
        .unwrap();

    clock.advance(Duration::minutes(10));
    let session = repo
        .browser_session()
        .finish(&clock, session)
        .await
        .unwrap();
    assert!(!session.is_valid());

    // Finished sessions are still found, with their end timestamp
    let found = repo
        .browser_session()
        .find_by_token(&token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.finished_at, Some(clock.now()));
    assert!(!found.is_valid());

    // Locking the user invalidates the session too
    let other_token = BrowserSession::generate_token(&mut rng);
    repo.browser_session()
        .add(&mut rng, &clock, &user, other_token.clone())
        .await
        .unwrap();
    repo.user().lock(&clock, user).await.unwrap();
    let found = repo
        .browser_session()
        .find_by_token(&other_token)
        .await
        .unwrap()
        .unwrap();
    assert!(found.active());
    assert!(!found.is_valid());

    repo.save().await.unwrap();
}
