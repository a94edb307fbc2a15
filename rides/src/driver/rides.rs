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

//! Operations on rides.

use crate::db;
use crate::driver::{Driver, REFERENTIAL_INTEGRITY_MESSAGE, write_error};
use crate::model::*;
use log::{debug, info};
use ridehail_core::db::{DbError, Executor};
use ridehail_core::driver::{DriverError, DriverResult};
use ridehail_identity::model::Identity;

/// Fetches the ride `id`, mapping its absence to a user-facing error.
async fn get_ride(ex: &mut Executor, id: RideId) -> DriverResult<Ride> {
    match db::get_ride(ex, id).await {
        Ok(ride) => Ok(ride),
        Err(DbError::NotFound) => Err(DriverError::NotFound("Ride is not found".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Fetches the driver `id`, mapping its absence to a user-facing error.
async fn get_driver(ex: &mut Executor, id: DriverId) -> DriverResult<DriverAvailability> {
    match db::get_driver(ex, id).await {
        Ok(driver) => Ok(driver),
        Err(DbError::NotFound) => Err(DriverError::NotFound("Driver not found".to_owned())),
        Err(e) => Err(e.into()),
    }
}

impl Driver {
    /// Gets all rides in their current state.
    pub(crate) async fn list_rides(self) -> DriverResult<Vec<Ride>> {
        let rides = db::get_rides(&mut self.db.ex().await?).await?;
        Ok(rides)
    }

    /// Makes the driver behind `caller` take the pending ride `ride_id`.
    ///
    /// On success, the ride becomes accepted by the driver and the driver stops being available.
    pub(crate) async fn accept_ride(self, caller: Identity, ride_id: RideId) -> DriverResult<()> {
        let driver_id = match caller.as_driver() {
            Some(driver_id) => driver_id,
            None => {
                return Err(DriverError::Forbidden("Only drivers can accept rides".to_owned()));
            }
        };

        let not_pending = || {
            debug!("Driver {} cannot accept ride {}: not pending", driver_id, ride_id);
            DriverError::InvalidState("Ride is not pending and cannot be accepted".to_owned())
        };
        let not_available = || {
            debug!("Driver {} cannot accept ride {}: driver not available", driver_id, ride_id);
            DriverError::InvalidState("Driver is not available".to_owned())
        };

        let mut tx = self.db.begin().await?;

        let ride = get_ride(tx.ex(), ride_id).await?;
        if *ride.status() != RideStatus::Pending {
            return Err(not_pending());
        }

        let driver = get_driver(tx.ex(), driver_id).await?;
        if !driver.is_available() {
            return Err(not_available());
        }

        if !db::assign_ride(tx.ex(), ride_id, driver_id).await.map_err(write_error)? {
            return Err(not_pending());
        }
        if !db::take_driver(tx.ex(), driver_id).await.map_err(write_error)? {
            return Err(not_available());
        }

        tx.commit().await?;
        info!("Ride {} accepted by driver {}", ride_id, driver_id);
        Ok(())
    }

    /// Moves the accepted ride `ride_id` to the terminal status `to` and makes its driver
    /// available again.
    ///
    /// `not_accepted` is the reason reported when the ride is not in the accepted status.
    async fn finish_ride(
        self,
        ride_id: RideId,
        to: RideStatus,
        not_accepted: &'static str,
    ) -> DriverResult<()> {
        let rejected = || {
            debug!("Ride {} cannot become {}: not accepted", ride_id, to.as_str());
            DriverError::InvalidState(not_accepted.to_owned())
        };

        let mut tx = self.db.begin().await?;

        let ride = get_ride(tx.ex(), ride_id).await?;
        if *ride.status() != RideStatus::Accepted {
            return Err(rejected());
        }
        let driver_id = match ride.driver_id() {
            Some(driver_id) => *driver_id,
            None => {
                return Err(DriverError::BackendError(format!(
                    "Accepted ride {} has no driver",
                    ride_id
                )));
            }
        };

        if !db::update_ride_status(tx.ex(), ride_id, RideStatus::Accepted, to)
            .await
            .map_err(write_error)?
        {
            return Err(rejected());
        }
        match db::release_driver(tx.ex(), driver_id).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                return Err(DriverError::Conflict(REFERENTIAL_INTEGRITY_MESSAGE.to_owned()));
            }
            Err(e) => return Err(write_error(e)),
        }

        tx.commit().await?;
        info!("Ride {} {} by driver {}", ride_id, to.as_str(), driver_id);
        Ok(())
    }

    /// Completes the accepted ride `ride_id`, releasing its driver.
    pub(crate) async fn complete_ride(self, ride_id: RideId) -> DriverResult<()> {
        self.finish_ride(
            ride_id,
            RideStatus::Completed,
            "Ride has not been accepted and cannot be completed",
        )
        .await
    }

    /// Cancels the accepted ride `ride_id`, releasing its driver.
    pub(crate) async fn cancel_ride(self, ride_id: RideId) -> DriverResult<()> {
        self.finish_ride(
            ride_id,
            RideStatus::Canceled,
            "Ride has not been accepted and cannot be canceled",
        )
        .await
    }
}
