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

//! The public registration setting service
//!
//! This owns the platform-wide flag gating self-service sign-ups. Reads are
//! open to everyone. Writes go through [`authorize_update`], so the owner
//! check holds no matter which surface (HTTP, CLI) calls in.

use gantry_data_model::User;
use gantry_storage::{site_settings::SiteSettingsRepository, Clock, RepositoryError};
use thiserror::Error;

/// Errors returned by the public registration setting service
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The requester does not hold the owner role, or is anonymous
    #[error("Only the owner can change the public registration setting")]
    Forbidden,

    /// The persistence layer could not be reached or failed the operation
    #[error("The settings storage is unavailable")]
    StorageUnavailable(#[source] RepositoryError),
}

impl From<RepositoryError> for RegistrationError {
    fn from(value: RepositoryError) -> Self {
        Self::StorageUnavailable(value)
    }
}

/// Check that the requester may change the public registration setting
///
/// Only users holding the owner role pass. Anonymous requesters are denied
/// like any other non-owner.
///
/// # Errors
///
/// Returns [`RegistrationError::Forbidden`] if the requester is not an owner
pub fn authorize_update(requester: Option<&User>) -> Result<&User, RegistrationError> {
    match requester {
        Some(user) if user.is_owner() => Ok(user),
        _ => Err(RegistrationError::Forbidden),
    }
}

/// Get whether public registration is currently enabled
///
/// A setting which was never stored reads as disabled.
///
/// # Errors
///
/// Returns [`RegistrationError::StorageUnavailable`] if the storage failed.
/// No value is made up in that case.
#[tracing::instrument(name = "registration.get_status", skip_all, err)]
pub async fn get_status<R>(settings: &mut R) -> Result<bool, RegistrationError>
where
    R: SiteSettingsRepository<Error = RepositoryError> + ?Sized,
{
    let setting = settings.registration().await?.unwrap_or_default();
    Ok(setting.public_registration_enabled)
}

/// Overwrite the public registration flag on behalf of `requester`
///
/// The owner check runs before touching the storage. The write itself is a
/// single upsert in the caller's transaction, which the caller has to save.
/// Setting the current value again is accepted and changes nothing but the
/// update timestamp.
///
/// Returns the value which was written
///
/// # Errors
///
/// Returns [`RegistrationError::Forbidden`] if the requester is not an owner,
/// or [`RegistrationError::StorageUnavailable`] if the write failed
#[tracing::instrument(
    name = "registration.update_status",
    skip_all,
    fields(
        registration.enabled = enabled,
        user.id,
    ),
)]
pub async fn update_status<R>(
    settings: &mut R,
    clock: &dyn Clock,
    requester: Option<&User>,
    enabled: bool,
) -> Result<bool, RegistrationError>
where
    R: SiteSettingsRepository<Error = RepositoryError> + ?Sized,
{
    let owner = match authorize_update(requester) {
        Ok(owner) => owner,
        Err(e) => {
            tracing::warn!(
                user.username = requester.map(|u| u.username.as_str()),
                "Refused to change the public registration setting"
            );
            return Err(e);
        }
    };
    tracing::Span::current().record("user.id", tracing::field::display(owner.id));

    let setting = settings
        .set_public_registration(clock, enabled)
        .await
        .map_err(|e| {
            tracing::error!(error = &e as &dyn std::error::Error, "Failed to store the setting");
            RegistrationError::StorageUnavailable(e)
        })?;

    tracing::info!(
        user.username = %owner.username,
        state = %setting.state(),
        "Public registration setting changed"
    );

    Ok(setting.public_registration_enabled)
}

/// Store the configured initial value, unless the setting already exists
///
/// Returns `true` if the value was written
///
/// # Errors
///
/// Returns [`RegistrationError::StorageUnavailable`] if the storage failed
#[tracing::instrument(
    name = "registration.init_status",
    skip_all,
    fields(registration.enabled = initial),
    err,
)]
pub async fn init_status<R>(settings: &mut R, initial: bool) -> Result<bool, RegistrationError>
where
    R: SiteSettingsRepository<Error = RepositoryError> + ?Sized,
{
    let inserted = settings.init_public_registration(initial).await?;
    Ok(inserted)
}
