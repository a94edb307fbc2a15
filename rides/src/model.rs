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

//! High-level data types.

use derive_getters::Getters;
use derive_more::{Display, From};
use ridehail_core::model::{ModelError, ModelResult};
pub use ridehail_identity::model::{DriverId, UserId};
use serde::{Deserialize, Serialize};

/// Identifier of a ride.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct RideId(i64);

impl RideId {
    /// Returns the raw numeric value of the identifier.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

/// Lifecycle states of a ride.
///
/// `Pending` is the initial state.  `Completed` and `Canceled` are terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    /// The ride has been requested but no driver has taken it yet.
    Pending,

    /// A driver has taken the ride.
    Accepted,

    /// The ride finished successfully.
    Completed,

    /// The ride was abandoned after a driver had taken it.
    Canceled,
}

impl RideStatus {
    /// Returns the textual representation of the status used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::Completed => "completed",
            RideStatus::Canceled => "canceled",
        }
    }

    /// Parses the persisted textual representation of a status.
    pub fn parse(s: &str) -> ModelResult<Self> {
        match s {
            "pending" => Ok(RideStatus::Pending),
            "accepted" => Ok(RideStatus::Accepted),
            "completed" => Ok(RideStatus::Completed),
            "canceled" => Ok(RideStatus::Canceled),
            _ => Err(ModelError(format!("Unknown ride status '{}'", s))),
        }
    }
}

/// Pickup location of a ride.  Opaque to the ride lifecycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,
}

/// A ride as persisted in the database.
///
/// A ride has a driver if and only if it is not pending, and this type cannot be constructed
/// otherwise.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct Ride {
    /// Unique identifier of the ride.
    id: RideId,

    /// The rider that requested the ride.
    user_id: UserId,

    /// The driver that took the ride, if any.
    driver_id: Option<DriverId>,

    /// Current lifecycle state.
    status: RideStatus,

    /// Pickup location.
    #[serde(flatten)]
    coordinates: Coordinates,
}

impl Ride {
    /// Creates a new ride from its parts, validating that `driver_id` is consistent with `status`.
    pub fn new(
        id: RideId,
        user_id: UserId,
        driver_id: Option<DriverId>,
        status: RideStatus,
        coordinates: Coordinates,
    ) -> ModelResult<Self> {
        match (status, driver_id) {
            (RideStatus::Pending, Some(driver_id)) => {
                return Err(ModelError(format!(
                    "Pending ride {} cannot have driver {}",
                    id, driver_id
                )));
            }
            (status, None) if status != RideStatus::Pending => {
                return Err(ModelError(format!(
                    "Ride {} in status {} must have a driver",
                    id,
                    status.as_str()
                )));
            }
            _ => (),
        }
        Ok(Self { id, user_id, driver_id, status, coordinates })
    }
}

/// The availability record of a driver.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct DriverAvailability {
    /// Unique identifier of the driver.
    id: DriverId,

    /// Whether the driver can accept new rides.
    is_available: bool,
}

impl DriverAvailability {
    /// Creates a new availability record.
    pub fn new(id: DriverId, is_available: bool) -> Self {
        Self { id, is_available }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_status_parse() {
        for status in
            [RideStatus::Pending, RideStatus::Accepted, RideStatus::Completed, RideStatus::Canceled]
        {
            assert_eq!(status, RideStatus::parse(status.as_str()).unwrap());
        }
        assert_eq!(
            ModelError("Unknown ride status 'cancelled'".to_owned()),
            RideStatus::parse("cancelled").unwrap_err()
        );
    }

    #[test]
    fn test_ride_driver_iff_not_pending() {
        let coords = Coordinates { latitude: 6.5, longitude: 3.3 };

        Ride::new(RideId::from(1), UserId::from(1), None, RideStatus::Pending, coords).unwrap();
        for status in [RideStatus::Accepted, RideStatus::Completed, RideStatus::Canceled] {
            Ride::new(RideId::from(1), UserId::from(1), Some(DriverId::from(2)), status, coords)
                .unwrap();
        }

        assert_eq!(
            ModelError("Pending ride 1 cannot have driver 2".to_owned()),
            Ride::new(
                RideId::from(1),
                UserId::from(1),
                Some(DriverId::from(2)),
                RideStatus::Pending,
                coords
            )
            .unwrap_err()
        );
        for status in [RideStatus::Accepted, RideStatus::Completed, RideStatus::Canceled] {
            let err =
                Ride::new(RideId::from(1), UserId::from(1), None, status, coords).unwrap_err();
            assert!(err.0.contains("must have a driver"));
        }
    }

    #[test]
    fn test_ride_json() {
        let ride = Ride::new(
            RideId::from(3),
            UserId::from(1),
            Some(DriverId::from(2)),
            RideStatus::Accepted,
            Coordinates { latitude: 1.5, longitude: -2.25 },
        )
        .unwrap();
        assert_eq!(
            serde_json::json!({
                "id": 3,
                "user_id": 1,
                "driver_id": 2,
                "status": "accepted",
                "latitude": 1.5,
                "longitude": -2.25,
            }),
            serde_json::to_value(&ride).unwrap()
        );
    }

    #[test]
    fn test_driver_availability_json() {
        let driver = DriverAvailability::new(DriverId::from(4), true);
        assert_eq!(
            serde_json::json!({"id": 4, "is_available": true}),
            serde_json::to_value(&driver).unwrap()
        );
    }
}
