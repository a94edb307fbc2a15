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

//! Operations on drivers.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use log::info;
use ridehail_core::db::DbError;
use ridehail_core::driver::{DriverError, DriverResult};
use ridehail_identity::model::Identity;

impl Driver {
    /// Flips the availability of the driver behind `caller` and returns the updated record.
    ///
    /// This is independent of the ride lifecycle: a driver can mark itself available while in
    /// the middle of a ride.
    pub(crate) async fn toggle_availability(
        self,
        caller: Identity,
    ) -> DriverResult<DriverAvailability> {
        let driver_id = match caller.as_driver() {
            Some(driver_id) => driver_id,
            None => {
                return Err(DriverError::Forbidden(
                    "Only drivers can toggle their availability".to_owned(),
                ));
            }
        };

        let mut tx = self.db.begin().await?;
        let driver = match db::toggle_driver_availability(tx.ex(), driver_id).await {
            Ok(driver) => driver,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound("Driver not found".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        info!("Driver {} is now available: {}", driver_id, driver.is_available());
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_toggle_availability_flips() {
        let context = TestContext::setup().await;

        let driver_id = context.create_driver(true).await;

        let driver =
            context.driver().toggle_availability(Identity::Driver(driver_id)).await.unwrap();
        assert_eq!(DriverAvailability::new(driver_id, false), driver);
        assert!(!context.is_available(driver_id).await);

        let driver =
            context.driver().toggle_availability(Identity::Driver(driver_id)).await.unwrap();
        assert_eq!(DriverAvailability::new(driver_id, true), driver);
        assert!(context.is_available(driver_id).await);

        context.close().await;
    }

    #[tokio::test]
    async fn test_toggle_availability_only_affects_caller() {
        let context = TestContext::setup().await;

        let driver1 = context.create_driver(true).await;
        let driver2 = context.create_driver(false).await;

        context.driver().toggle_availability(Identity::Driver(driver2)).await.unwrap();

        assert!(context.is_available(driver1).await);
        assert!(context.is_available(driver2).await);

        context.close().await;
    }

    #[tokio::test]
    async fn test_toggle_availability_mid_ride() {
        let context = TestContext::setup().await;

        let (ride_id, driver_id) = context.create_accepted_ride().await;

        let driver =
            context.driver().toggle_availability(Identity::Driver(driver_id)).await.unwrap();
        assert!(*driver.is_available());

        // The ride is untouched by the manual toggle.
        let ride = context.get_ride(ride_id).await;
        assert_eq!(&RideStatus::Accepted, ride.status());
        assert_eq!(&Some(driver_id), ride.driver_id());

        context.close().await;
    }

    #[tokio::test]
    async fn test_toggle_availability_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Driver not found".to_owned()),
            context
                .driver()
                .toggle_availability(Identity::Driver(DriverId::from(77)))
                .await
                .unwrap_err()
        );

        context.close().await;
    }

    #[tokio::test]
    async fn test_toggle_availability_requires_driver_role() {
        let context = TestContext::setup().await;

        let user_id = context.create_user().await;

        assert_eq!(
            DriverError::Forbidden("Only drivers can toggle their availability".to_owned()),
            context.driver().toggle_availability(Identity::User(user_id)).await.unwrap_err()
        );

        context.close().await;
    }
}
