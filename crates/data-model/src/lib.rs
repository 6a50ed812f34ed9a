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

#![allow(clippy::module_name_repetitions)]

//! Domain types of the Gantry control plane, independent of any storage
//! backend

mod service_type;
mod site_settings;
mod users;

pub use ulid::Ulid;

pub use self::{
    service_type::{InvalidServiceTypeError, ServiceType},
    site_settings::{RegistrationSetting, RegistrationState},
    users::{BrowserSession, InvalidRoleError, Role, User},
};
