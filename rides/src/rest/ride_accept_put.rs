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

//! API to let a driver take a pending ride.

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
    let caller = authenticate(driver.identity(), &headers).await?;

    driver.accept_ride(caller, ride_id).await?;
    Ok(Json(MessageResponse::new("Successfully accepted ride")))
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::rest::testutils::*;
    use axum::http;
    use ridehail_core::rest::MessageResponse;
    use ridehail_core::rest::testutils::OneShotBuilder;
    use ridehail_core::test_payload_must_be_empty;
    use ridehail_identity::model::Identity;

    fn route(id: RideId) -> (http::Method, String) {
        (http::Method::PUT, format!("/rides/{}/accept", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let (user_id, _) = context.user_session().await;
        let (driver_id, token) = context.driver_session(true).await;
        let ride_id = context.create_ride(user_id).await;

        let response = OneShotBuilder::new(context.app(), route(ride_id))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<MessageResponse>()
            .await;
        assert_eq!(MessageResponse::new("Successfully accepted ride"), response);

        let ride = context.get_ride(ride_id).await;
        assert_eq!(&RideStatus::Accepted, ride.status());
        assert_eq!(&Some(driver_id), ride.driver_id());
        assert!(!context.is_available(driver_id).await);

        context.close().await;
    }

    #[tokio::test]
    async fn test_not_pending() {
        let context = TestContext::setup().await;

        let (ride_id, _) = context.create_accepted_ride().await;
        let (driver_id, token) = context.driver_session(true).await;

        for _ in 0..2 {
            OneShotBuilder::new(context.app(), route(ride_id))
                .with_bearer_auth(token.as_str())
                .send_empty()
                .await
                .expect_status(http::StatusCode::BAD_REQUEST)
                .expect_error("not pending")
                .await;
        }
        assert!(context.is_available(driver_id).await);

        context.close().await;
    }

    #[tokio::test]
    async fn test_driver_not_available() {
        let context = TestContext::setup().await;

        let (user_id, _) = context.user_session().await;
        let (_, token) = context.driver_session(false).await;
        let ride_id = context.create_ride(user_id).await;

        OneShotBuilder::new(context.app(), route(ride_id))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Driver is not available")
            .await;
        assert_eq!(&RideStatus::Pending, context.get_ride(ride_id).await.status());

        context.close().await;
    }

    #[tokio::test]
    async fn test_ride_not_found() {
        let context = TestContext::setup().await;

        let (_, token) = context.driver_session(true).await;

        OneShotBuilder::new(context.app(), route(RideId::from(999)))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Ride is not found")
            .await;

        context.close().await;
    }

    #[tokio::test]
    async fn test_driver_not_found() {
        let context = TestContext::setup().await;

        let (user_id, _) = context.user_session().await;
        let ride_id = context.create_ride(user_id).await;
        let token = context.login(Identity::Driver(DriverId::from(123))).await;

        OneShotBuilder::new(context.app(), route(ride_id))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Driver not found")
            .await;
        assert_eq!(&RideStatus::Pending, context.get_ride(ride_id).await.status());

        context.close().await;
    }

    #[tokio::test]
    async fn test_caller_is_not_a_driver() {
        let context = TestContext::setup().await;

        let (user_id, token) = context.user_session().await;
        let ride_id = context.create_ride(user_id).await;

        OneShotBuilder::new(context.app(), route(ride_id))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("Only drivers can accept rides")
            .await;
        assert_eq!(&RideStatus::Pending, context.get_ride(ride_id).await.status());

        context.close().await;
    }

    #[tokio::test]
    async fn test_unauthenticated() {
        let context = TestContext::setup().await;

        let (user_id, _) = context.user_session().await;
        let ride_id = context.create_ride(user_id).await;

        OneShotBuilder::new(context.app(), route(ride_id))
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .take_response()
            .await;
        assert_eq!(&RideStatus::Pending, context.get_ride(ride_id).await.status());

        context.close().await;
    }

    #[tokio::test]
    async fn test_bad_ride_id() {
        let context = TestContext::setup().await;

        let (_, token) = context.driver_session(true).await;

        OneShotBuilder::new(context.app(), (http::Method::PUT, "/rides/first/accept"))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .take_response()
            .await;

        context.close().await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(RideId::from(1)));
}
