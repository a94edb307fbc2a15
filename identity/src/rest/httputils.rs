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

//! Utilities to deal with HTTP authorization.

use crate::model::AccessToken;
use http::header::HeaderMap;
use ridehail_core::rest::{AUTH_SCHEME, RestError, RestResult, get_unique_header};

/// Validates that the `Authorization` HTTP header contains a textual payload for the bearer
/// scheme and returns it.
fn get_authorization_header(headers: &HeaderMap) -> RestResult<&str> {
    let authz = match get_unique_header(headers, &http::header::AUTHORIZATION) {
        Ok(Some(value)) => value,
        Ok(None) => return Err(RestError::unauthorized("Missing Authorization header")),
        Err(e) => return Err(RestError::unauthorized(e.to_string())),
    };

    let authz = authz.to_str().map_err(|e| {
        RestError::unauthorized(format!("Bad encoding in Authorization header: {}", e))
    })?;

    let mut fields = authz.splitn(2, ' ');
    let scheme = match fields.next() {
        Some(s) if !s.is_empty() => s,
        _ => return Err(RestError::unauthorized("Bad Authorization header: missing scheme")),
    };
    let payload = match fields.next() {
        Some(s) => s,
        None => return Err(RestError::unauthorized("Bad Authorization header: missing payload")),
    };

    if scheme != AUTH_SCHEME {
        return Err(RestError::unauthorized("Unsupported scheme"));
    }

    Ok(payload)
}

/// Assumes that the `headers` contain a bearer access token and extracts it.
pub fn get_bearer_auth(headers: &HeaderMap) -> RestResult<AccessToken> {
    let payload = get_authorization_header(headers)?;
    AccessToken::new(payload).map_err(|e| RestError::unauthorized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_get_bearer_auth_ok() {
        let token = AccessToken::generate();
        let mut headers = HeaderMap::new();
        headers.append(
            http::header::AUTHORIZATION,
            format!("Bearer {}", token.as_str()).parse().unwrap(),
        );
        assert_eq!(token, get_bearer_auth(&headers).unwrap());
    }

    #[test]
    fn test_get_bearer_auth_from_request() {
        let token = AccessToken::generate();
        let request = http::Request::builder()
            .uri("/api/test")
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .body(())
            .unwrap();
        assert_eq!(token, get_bearer_auth(request.headers()).unwrap());
    }

    /// Runs `get_bearer_auth` with an invalid set of header `values` and ensures that the call
    /// fails with an `Unauthorized` error that contains `exp_error` in the failure message.
    fn do_get_bearer_auth_error_test(exp_error: &str, values: &[&[u8]]) {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(http::header::AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        }
        match get_bearer_auth(&headers) {
            Err(RestError::Unauthorized { scheme, realm, message }) => {
                assert_eq!("Bearer", scheme);
                assert_eq!("ridehail", realm);
                assert!(message.contains(exp_error), "message '{}' lacks '{}'", message, exp_error);
            }
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_get_bearer_auth_missing_header() {
        do_get_bearer_auth_error_test("Missing Authorization header", &[]);
    }

    #[test]
    fn test_get_bearer_auth_duplicate_header() {
        do_get_bearer_auth_error_test(
            "cannot have more than one value",
            &[b"Bearer abcdefghijklmnopqrstuvwxyz", b"Bearer abcdefghijklmnopqrstuvwxyz"],
        );
    }

    #[test]
    fn test_get_bearer_auth_bad_encoding() {
        do_get_bearer_auth_error_test("Bad encoding", &[b"Bearer \xc3\x28"]);
    }

    #[test]
    fn test_get_bearer_auth_missing_scheme() {
        do_get_bearer_auth_error_test("missing scheme", &[b" abcdefghijklmnopqrstuvwxyz"]);
    }

    #[test]
    fn test_get_bearer_auth_missing_payload() {
        do_get_bearer_auth_error_test("missing payload", &[b"Bearer"]);
    }

    #[test]
    fn test_get_bearer_auth_bad_scheme() {
        do_get_bearer_auth_error_test("Unsupported scheme", &[b"Basic abcdefghijklmnopqrstuvwxyz"]);
    }

    #[test]
    fn test_get_bearer_auth_bad_token() {
        do_get_bearer_auth_error_test("Invalid access token", &[b"Bearer short"]);
    }
}
