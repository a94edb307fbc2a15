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

//! API to finish an accepted ride.

use crate::driver::Driver;
use crate::model::RideId;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use ridehail_core::rest::{EmptyBody, MessageResponse, RestError};
use ridehail_identity::rest::authenticate;

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<RideId>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<Json<MessageResponse>, RestError> {
    let _caller = authenticate(driver.identity(), &headers).await?;

    driver.complete_ride(ride_id).await?;
    Ok(Json(MessageResponse::new("Ride completed")))
}
