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

//! Business logic for the service.
//!
//! This layer owns the ride lifecycle: every transition re-validates its preconditions inside the
//! same transaction that performs the writes, and the writes themselves are conditioned on the
//! state that was validated.  A transition that loses a race against a concurrent one thus fails
//! the same way it would have failed had it run afterwards.

use ridehail_core::db::{Db, DbError};
use ridehail_core::driver::DriverError;
use ridehail_identity::driver::IdentityDriver;
use std::sync::Arc;

mod drivers;
mod rides;
#[cfg(test)]
pub(crate) mod testutils;

/// Message reported when a write trips over the referential integrity of the database.
const REFERENTIAL_INTEGRITY_MESSAGE: &str = "Foreign Key Constraint Error";

/// Converts a database error raised by a lifecycle write into a driver error.
fn write_error(e: DbError) -> DriverError {
    match e {
        DbError::ForeignKeyViolation => {
            DriverError::Conflict(REFERENTIAL_INTEGRITY_MESSAGE.to_owned())
        }
        e => e.into(),
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// The identity provider used to authenticate callers.
    identity: IdentityDriver,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(db: Arc<dyn Db + Send + Sync>, identity: IdentityDriver) -> Self {
        Self { db, identity }
    }

    /// Returns the identity provider so that the REST layer can authenticate requests.
    pub(crate) fn identity(&self) -> &IdentityDriver {
        &self.identity
    }
}
