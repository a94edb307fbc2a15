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

//! Database abstraction in terms of the operations needed by the server.
//!
//! Writes that change the lifecycle of a ride or the availability of a driver are conditioned on
//! the state the caller observed, and they report whether they matched any row.  Callers run them
//! inside a transaction and roll back when a condition no longer holds.

use crate::model::*;
use futures::TryStreamExt;
#[cfg(feature = "postgres")]
use ridehail_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use ridehail_core::db::sqlite;
use ridehail_core::db::{DbError, DbResult, Executor};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Converts the raw values of a ride row into a `Ride`, validating them.
fn build_ride(
    id: i64,
    user_id: i64,
    driver_id: Option<i64>,
    status: &str,
    latitude: f64,
    longitude: f64,
) -> DbResult<Ride> {
    let ride = Ride::new(
        RideId::from(id),
        UserId::from(user_id),
        driver_id.map(DriverId::from),
        RideStatus::parse(status)?,
        Coordinates { latitude, longitude },
    )?;
    Ok(ride)
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Ride {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let user_id: i64 = row.try_get("user_id").map_err(postgres::map_sqlx_error)?;
        let driver_id: Option<i64> = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let latitude: f64 = row.try_get("latitude").map_err(postgres::map_sqlx_error)?;
        let longitude: f64 = row.try_get("longitude").map_err(postgres::map_sqlx_error)?;

        build_ride(id, user_id, driver_id, &status, latitude, longitude)
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Ride {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let user_id: i64 = row.try_get("user_id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: Option<i64> = row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let latitude: f64 = row.try_get("latitude").map_err(sqlite::map_sqlx_error)?;
        let longitude: f64 = row.try_get("longitude").map_err(sqlite::map_sqlx_error)?;

        build_ride(id, user_id, driver_id, &status, latitude, longitude)
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for DriverAvailability {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let is_available: bool = row.try_get("is_available").map_err(postgres::map_sqlx_error)?;
        Ok(DriverAvailability::new(DriverId::from(id), is_available))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for DriverAvailability {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let is_available: bool = row.try_get("is_available").map_err(sqlite::map_sqlx_error)?;
        Ok(DriverAvailability::new(DriverId::from(id), is_available))
    }
}

/// Interprets the number of rows touched by a conditional update of a single entity.
fn matched_one(rows_affected: u64) -> DbResult<bool> {
    match rows_affected {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Registers a new rider and returns its identifier.
pub async fn create_user(ex: &mut Executor) -> DbResult<UserId> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO users DEFAULT VALUES RETURNING id";
            let row = sqlx::query(query_str)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO users DEFAULT VALUES RETURNING id";
            let row =
                sqlx::query(query_str).fetch_one(ex).await.map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(UserId::from(id))
}

/// Registers a new driver with an initial availability of `is_available`.
pub async fn create_driver(ex: &mut Executor, is_available: bool) -> DbResult<DriverAvailability> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO drivers (is_available) VALUES ($1) RETURNING id, is_available";
            let row = sqlx::query(query_str)
                .bind(is_available)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            DriverAvailability::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "INSERT INTO drivers (is_available) VALUES (?) RETURNING id, is_available";
            let row = sqlx::query(query_str)
                .bind(is_available)
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            DriverAvailability::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new pending ride for `user_id` with a pickup location at `coordinates`.
pub async fn create_ride(
    ex: &mut Executor,
    user_id: UserId,
    coordinates: Coordinates,
) -> DbResult<Ride> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO rides (user_id, latitude, longitude)
                VALUES ($1, $2, $3)
                RETURNING id, user_id, driver_id, status, latitude, longitude";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i64())
                .bind(coordinates.latitude)
                .bind(coordinates.longitude)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ride::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO rides (user_id, latitude, longitude)
                VALUES (?, ?, ?)
                RETURNING id, user_id, driver_id, status, latitude, longitude";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i64())
                .bind(coordinates.latitude)
                .bind(coordinates.longitude)
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ride::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the current state of the ride `id`.
pub async fn get_ride(ex: &mut Executor, id: RideId) -> DbResult<Ride> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, user_id, driver_id, status, latitude, longitude
                FROM rides WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ride::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, user_id, driver_id, status, latitude, longitude
                FROM rides WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ride::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all rides ordered by their identifier.
pub async fn get_rides(ex: &mut Executor) -> DbResult<Vec<Ride>> {
    let mut rides = vec![];
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, user_id, driver_id, status, latitude, longitude
                FROM rides ORDER BY id";
            let mut rows = sqlx::query(query_str).fetch(ex);
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                rides.push(Ride::try_from(row)?);
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, user_id, driver_id, status, latitude, longitude
                FROM rides ORDER BY id";
            let mut rows = sqlx::query(query_str).fetch(ex);
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                rides.push(Ride::try_from(row)?);
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(rides)
}

/// Gets the availability record of the driver `id`.
pub async fn get_driver(ex: &mut Executor, id: DriverId) -> DbResult<DriverAvailability> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, is_available FROM drivers WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            DriverAvailability::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, is_available FROM drivers WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            DriverAvailability::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Assigns `driver_id` to the ride `id` and moves it to `accepted`, but only if the ride is still
/// pending.
///
/// Returns false if the ride does not exist or is not pending anymore.
pub async fn assign_ride(ex: &mut Executor, id: RideId, driver_id: DriverId) -> DbResult<bool> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE rides SET status = $1, driver_id = $2
                WHERE id = $3 AND status = $4";
            let done = sqlx::query(query_str)
                .bind(RideStatus::Accepted.as_str())
                .bind(driver_id.as_i64())
                .bind(id.as_i64())
                .bind(RideStatus::Pending.as_str())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE rides SET status = ?, driver_id = ?
                WHERE id = ? AND status = ?";
            let done = sqlx::query(query_str)
                .bind(RideStatus::Accepted.as_str())
                .bind(driver_id.as_i64())
                .bind(id.as_i64())
                .bind(RideStatus::Pending.as_str())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    matched_one(rows_affected)
}

/// Moves the ride `id` from status `from` to status `to`, keeping its driver.
///
/// Returns false if the ride does not exist or is not in the `from` status anymore.
pub async fn update_ride_status(
    ex: &mut Executor,
    id: RideId,
    from: RideStatus,
    to: RideStatus,
) -> DbResult<bool> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE rides SET status = $1 WHERE id = $2 AND status = $3";
            let done = sqlx::query(query_str)
                .bind(to.as_str())
                .bind(id.as_i64())
                .bind(from.as_str())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE rides SET status = ? WHERE id = ? AND status = ?";
            let done = sqlx::query(query_str)
                .bind(to.as_str())
                .bind(id.as_i64())
                .bind(from.as_str())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    matched_one(rows_affected)
}

/// Marks the driver `id` as unavailable, but only if it is currently available.
///
/// Returns false if the driver does not exist or is already unavailable.
pub async fn take_driver(ex: &mut Executor, id: DriverId) -> DbResult<bool> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "UPDATE drivers SET is_available = FALSE WHERE id = $1 AND is_available = TRUE";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "UPDATE drivers SET is_available = FALSE WHERE id = ? AND is_available = TRUE";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    matched_one(rows_affected)
}

/// Marks the driver `id` as available.
pub async fn release_driver(ex: &mut Executor, id: DriverId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE drivers SET is_available = TRUE WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE drivers SET is_available = TRUE WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if matched_one(rows_affected)? { Ok(()) } else { Err(DbError::NotFound) }
}

/// Flips the availability of the driver `id` and returns the updated record.
pub async fn toggle_driver_availability(
    ex: &mut Executor,
    id: DriverId,
) -> DbResult<DriverAvailability> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE drivers SET is_available = NOT is_available
                WHERE id = $1
                RETURNING id, is_available";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            DriverAvailability::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE drivers SET is_available = NOT is_available
                WHERE id = ?
                RETURNING id, is_available";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            DriverAvailability::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}
