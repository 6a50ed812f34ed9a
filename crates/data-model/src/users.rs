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

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{
    distributions::{Alphanumeric, DistString},
    Rng,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// The closed set of roles a user can hold on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The elevated role, allowed to change platform-wide settings
    Owner,

    /// Manages projects and members, but not platform-wide settings
    Admin,

    /// A regular user
    Member,
}

impl Role {
    /// All the known roles
    pub const ALL: [Self; 3] = [Self::Owner, Self::Admin, Self::Member];

    /// Returns `true` if the role is [`Owner`].
    ///
    /// [`Owner`]: Role::Owner
    #[must_use]
    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// The string representation of the role, as stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`Role`]
#[derive(Debug, Error)]
#[error("invalid role {0:?}")]
pub struct InvalidRoleError(String);

impl FromStr for Role {
    type Err = InvalidRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(InvalidRoleError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Ulid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns `true` unless the user is locked.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.locked_at.is_none()
    }

    /// Returns `true` if the user holds the [`Role::Owner`] role.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }
}

impl User {
    #[doc(hidden)]
    #[must_use]
    pub fn samples(now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<Self> {
        [("alice", Role::Owner), ("bob", Role::Admin), ("charlie", Role::Member)]
            .into_iter()
            .map(|(username, role)| User {
                id: Ulid::from_datetime_with_source(now.into(), &mut *rng),
                username: username.to_owned(),
                role,
                created_at: now,
                locked_at: None,
            })
            .collect()
    }
}

/// A session opened by a user, identified by an opaque bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserSession {
    pub id: Ulid,
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BrowserSession {
    /// Returns `true` if the session has not been finished.
    #[must_use]
    pub fn active(&self) -> bool {
        self.finished_at.is_none()
    }

    /// Returns `true` if both the session and its user can still be used.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.active() && self.user.is_valid()
    }

    /// Generate a new random session token
    pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> String {
        let random_part = Alphanumeric.sample_string(rng, 30);
        format!("gst_{random_part}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    use super::*;

    #[test]
    fn role_round_trips_through_its_string_form() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }

        assert!("superuser".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn only_owner_is_owner() {
        assert!(Role::Owner.is_owner());
        assert!(!Role::Admin.is_owner());
        assert!(!Role::Member.is_owner());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Member).unwrap();
        assert_eq!(json, r#""member""#);
    }

    #[test]
    fn session_validity() {
        let now = Utc.with_ymd_and_hms(2022, 1, 16, 14, 40, 0).unwrap();
        let mut rng = ChaChaRng::seed_from_u64(42);
        let user = User::samples(now, &mut rng).remove(0);

        let mut session = BrowserSession {
            id: Ulid::nil(),
            user,
            created_at: now,
            finished_at: None,
        };
        assert!(session.is_valid());

        session.user.locked_at = Some(now);
        assert!(session.active());
        assert!(!session.is_valid());

        session.user.locked_at = None;
        session.finished_at = Some(now);
        assert!(!session.is_valid());
    }

    #[test]
    fn session_tokens_are_prefixed_and_random() {
        let mut rng = ChaChaRng::seed_from_u64(42);
        let a = BrowserSession::generate_token(&mut rng);
        let b = BrowserSession::generate_token(&mut rng);

        assert!(a.starts_with("gst_"));
        assert_eq!(a.len(), 34);
        assert_ne!(a, b);
    }
}
