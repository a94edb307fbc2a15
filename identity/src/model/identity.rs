// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! The `Identity` data type and the identifiers it carries.

use derive_more::{Display, From};
use ridehail_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Identifier of a rider.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Returns the raw numeric value of the identifier.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

/// Identifier of a driver.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DriverId(i64);

impl DriverId {
    /// Returns the raw numeric value of the identifier.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

/// The kind of principal that owns a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// A rider that requests rides.
    User,

    /// A driver that serves rides.
    Driver,
}

impl Role {
    /// Returns the textual representation of the role used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Driver => "driver",
        }
    }

    /// Parses the persisted textual representation of a role.
    pub fn parse(s: &str) -> ModelResult<Self> {
        match s {
            "user" => Ok(Role::User),
            "driver" => Ok(Role::Driver),
            _ => Err(ModelError(format!("Unknown role '{}'", s))),
        }
    }
}

/// The authenticated principal behind a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Identity {
    /// The caller is a rider.
    User(UserId),

    /// The caller is a driver.
    Driver(DriverId),
}

impl Identity {
    /// Reconstructs an identity from its persisted parts.
    pub fn from_parts(role: Role, id: i64) -> Self {
        match role {
            Role::User => Identity::User(UserId(id)),
            Role::Driver => Identity::Driver(DriverId(id)),
        }
    }

    /// Returns the role of this identity.
    pub fn role(&self) -> Role {
        match self {
            Identity::User(_) => Role::User,
            Identity::Driver(_) => Role::Driver,
        }
    }

    /// Returns the raw identifier of the principal regardless of its role.
    pub fn id(&self) -> i64 {
        match self {
            Identity::User(id) => id.0,
            Identity::Driver(id) => id.0,
        }
    }

    /// Returns the driver identifier if this identity belongs to a driver.
    pub fn as_driver(&self) -> Option<DriverId> {
        match self {
            Identity::User(_) => None,
            Identity::Driver(id) => Some(*id),
        }
    }
}
