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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::*;
use crate::rest::app;
use axum::Router;
use ridehail_identity::model::{AccessToken, Identity};

/// State of a running test against the REST API.
pub(crate) struct TestContext {
    /// Context of the underlying business layer, which gives direct access to the database.
    inner: DriverTestContext,

    /// The application router under test.
    app: Router,
}

impl TestContext {
    /// Initializes the REST API against an in-memory database.
    pub(crate) async fn setup() -> Self {
        let inner = DriverTestContext::setup().await;
        let app = app(inner.driver());
        Self { inner, app }
    }

    /// Gets a copy of the application router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns its application router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Creates a session for `identity` without registering the entity behind it.
    pub(crate) async fn login(&self, identity: Identity) -> AccessToken {
        self.inner.login(identity).await
    }

    /// Registers a new rider and returns its identifier and an access token for it.
    pub(crate) async fn user_session(&self) -> (UserId, AccessToken) {
        let user_id = self.inner.create_user().await;
        let token = self.inner.login(Identity::User(user_id)).await;
        (user_id, token)
    }

    /// Registers a new driver and returns its identifier and an access token for it.
    pub(crate) async fn driver_session(&self, is_available: bool) -> (DriverId, AccessToken) {
        let driver_id = self.inner.create_driver(is_available).await;
        let token = self.inner.login(Identity::Driver(driver_id)).await;
        (driver_id, token)
    }

    /// Requests a new pending ride on behalf of `user_id`.
    pub(crate) async fn create_ride(&self, user_id: UserId) -> RideId {
        self.inner.create_ride(user_id).await
    }

    /// Creates a ride accepted by a new driver.
    pub(crate) async fn create_accepted_ride(&self) -> (RideId, DriverId) {
        self.inner.create_accepted_ride().await
    }

    /// Gets the current state of a ride.
    pub(crate) async fn get_ride(&self, id: RideId) -> Ride {
        self.inner.get_ride(id).await
    }

    /// Gets the current availability of a driver.
    pub(crate) async fn is_available(&self, id: DriverId) -> bool {
        self.inner.is_available(id).await
    }

    /// Releases the database.
    pub(crate) async fn close(self) {
        drop(self.app);
        self.inner.close().await;
    }
}
