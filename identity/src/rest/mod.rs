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

//! REST-level helpers to authenticate incoming requests.

use crate::driver::IdentityDriver;
use crate::model::Identity;
use http::header::HeaderMap;
use ridehail_core::rest::RestResult;

mod httputils;
pub use httputils::get_bearer_auth;

/// Authenticates the request that carried `headers` and returns the identity of the caller.
pub async fn authenticate(driver: &IdentityDriver, headers: &HeaderMap) -> RestResult<Identity> {
    let token = get_bearer_auth(headers)?;
    Ok(driver.get_identity(token).await?)
}
