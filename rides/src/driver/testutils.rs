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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use ridehail_core::clocks::SystemClock;
use ridehail_core::db::{Db, Executor};
use ridehail_identity::driver::testutils::login_as;
use ridehail_identity::driver::{IdentityDriver, IdentityOptions};
use ridehail_identity::model::{AccessToken, Identity};
use std::sync::Arc;

/// Pickup location used by rides created in tests.
pub(crate) const PICKUP: Coordinates = Coordinates { latitude: 6.5244, longitude: 3.3792 };

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used to issue sessions.
    clock: Arc<SystemClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database with both the identity and the rides
    /// schemas.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(ridehail_core::db::sqlite::testutils::setup().await);
        {
            let mut ex = db.ex().await.unwrap();
            ridehail_identity::db::init_schema(&mut ex).await.unwrap();
            db::init_schema(&mut ex).await.unwrap();
        }

        let clock = Arc::new(SystemClock::default());
        let identity = IdentityDriver::new(db.clone(), clock.clone(), IdentityOptions::default());
        let driver = Driver::new(db.clone(), identity);
        Self { db, clock, driver }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates a session for `identity` and returns its access token.
    pub(crate) async fn login(&self, identity: Identity) -> AccessToken {
        login_as(self.db.as_ref(), self.clock.as_ref(), identity).await
    }

    /// Registers a new rider.
    pub(crate) async fn create_user(&self) -> UserId {
        db::create_user(&mut self.ex().await).await.unwrap()
    }

    /// Registers a new driver with the given initial availability.
    pub(crate) async fn create_driver(&self, is_available: bool) -> DriverId {
        *db::create_driver(&mut self.ex().await, is_available).await.unwrap().id()
    }

    /// Requests a new ride on behalf of `user_id`.
    pub(crate) async fn create_ride(&self, user_id: UserId) -> RideId {
        *db::create_ride(&mut self.ex().await, user_id, PICKUP).await.unwrap().id()
    }

    /// Creates a ride that has already been accepted by a new driver.  The driver is left
    /// unavailable, as it would be after a real accept.
    pub(crate) async fn create_accepted_ride(&self) -> (RideId, DriverId) {
        let user_id = self.create_user().await;
        let ride_id = self.create_ride(user_id).await;
        let driver_id = self.create_driver(true).await;

        let mut tx = self.db.begin().await.unwrap();
        assert!(db::assign_ride(tx.ex(), ride_id, driver_id).await.unwrap());
        assert!(db::take_driver(tx.ex(), driver_id).await.unwrap());
        tx.commit().await.unwrap();

        (ride_id, driver_id)
    }

    /// Gets the current state of a ride.
    pub(crate) async fn get_ride(&self, id: RideId) -> Ride {
        db::get_ride(&mut self.ex().await, id).await.unwrap()
    }

    /// Gets the current availability of a driver.
    pub(crate) async fn is_available(&self, id: DriverId) -> bool {
        *db::get_driver(&mut self.ex().await, id).await.unwrap().is_available()
    }

    /// Flips the availability of a driver behind the back of the business logic.
    pub(crate) async fn toggle(&self, id: DriverId) {
        db::toggle_driver_availability(&mut self.ex().await, id).await.unwrap();
    }

    /// Makes every subsequent update to the `drivers` table fail with a backend error, leaving
    /// reads and updates to other tables untouched.
    pub(crate) async fn break_driver_updates(&self) {
        let query_str = "
            CREATE TRIGGER fail_driver_updates BEFORE UPDATE ON drivers
            BEGIN
                SELECT RAISE(ABORT, 'Driver updates are disabled');
            END
        ";
        match &mut self.ex().await {
            Executor::Sqlite(ex) => {
                sqlx::query(query_str).execute(ex).await.unwrap();
            }

            #[allow(unused)]
            _ => unreachable!(),
        }
    }

    /// Releases the database.
    pub(crate) async fn close(self) {
        drop(self.driver);
        self.db.close().await;
    }
}
