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

//! REST interface for the ride-hailing service.

use crate::driver::Driver;
use axum::Router;

mod driver_availability_put;
mod ride_accept_put;
mod ride_cancel_put;
mod ride_complete_put;
mod rides_get;
#[cfg(test)]
mod testutils;

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, put};
    Router::new()
        .route("/rides", get(rides_get::handler))
        .route("/rides/:id/accept", put(ride_accept_put::handler))
        .route("/rides/:id/complete", put(ride_complete_put::handler))
        .route("/rides/:id/cancel", put(ride_cancel_put::handler))
        .route("/drivers/me/toggle-availability", put(driver_availability_put::handler))
        .with_state(driver)
}
