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

//! Generic business logic for any service.
//!
//! Every service implements its own `Driver` type, which holds the database and any other
//! collaborators the business logic needs:
//!
//! ```rust
//! use ridehail_core::db::Db;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! pub struct Driver {
//!     /// The database that the driver uses for persistence.
//!     db: Arc<dyn Db + Send + Sync>,
//!
//!     // ... other fields here ...
//! }
//! ```
//!
//! Every operation implemented in the `Driver` should consume `self` because this is the layer
//! that coordinates multiple operations against the database inside a single transaction.
//! Consuming `self` prevents the caller from easily issuing multiple operations against the driver,
//! as this would require a clone and highlight an undesirable pattern.

use crate::db::DbError;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that a write clashed with the referential integrity of the stored data.
    #[error("{0}")]
    Conflict(String),

    /// Indicates that the caller is authenticated but is not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Indicates that an entity is not in a state that admits the requested operation.
    #[error("{0}")]
    InvalidState(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the caller could not be authenticated.
    #[error("{0}")]
    Unauthorized(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::ForeignKeyViolation => DriverError::Conflict(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db_error() {
        assert_eq!(
            DriverError::Conflict("Foreign key constraint violated".to_owned()),
            DriverError::from(DbError::ForeignKeyViolation)
        );
        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            DriverError::from(DbError::NotFound)
        );
        assert_eq!(
            DriverError::BackendError("Unavailable".to_owned()),
            DriverError::from(DbError::Unavailable)
        );
        assert_eq!(
            DriverError::BackendError("Data integrity error: bad row".to_owned()),
            DriverError::from(DbError::DataIntegrityError("bad row".to_owned()))
        );
    }
}
