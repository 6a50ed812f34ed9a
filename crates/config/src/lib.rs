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

//! Application configuration logic
//!
//! Each part of the configuration file is a [`ConfigurationSection`], which
//! knows where it lives in the merged [`Figment`] and how to validate itself.

#![deny(missing_docs, rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

use figment::{error::Error as FigmentError, Figment};
use serde::de::DeserializeOwned;

pub(crate) mod schema;
mod sections;

pub use self::sections::*;

/// Trait implemented by every configuration section, to load it from the
/// relevant part of a [`Figment`]
pub trait ConfigurationSection: Sized + DeserializeOwned {
    /// Where this section lives relative to the root, `None` for the root
    /// itself
    const PATH: Option<&'static str> = None;

    /// Validate the configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    fn validate(&self, _figment: &Figment) -> Result<(), FigmentError> {
        Ok(())
    }

    /// Extract and validate this section
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration could not be loaded
    fn extract(figment: &Figment) -> Result<Self, FigmentError> {
        let this: Self = if let Some(path) = Self::PATH {
            figment.extract_inner(path)?
        } else {
            figment.extract()?
        };

        this.validate(figment)?;
        Ok(this)
    }
}

/// Extension trait for sections which have a sensible default when they are
/// missing from the configuration
pub trait ConfigurationSectionExt: ConfigurationSection + Default {
    /// Extract the section, or return its default value if the section is not
    /// present at all
    ///
    /// # Errors
    ///
    /// Returns an error if the section is present but invalid
    fn extract_or_default(figment: &Figment) -> Result<Self, FigmentError> {
        let Some(path) = Self::PATH else {
            return Self::extract(figment);
        };

        if !figment.contains(path) {
            return Ok(Self::default());
        }

        Self::extract(figment)
    }
}

impl<T: ConfigurationSection + Default> ConfigurationSectionExt for T {}
