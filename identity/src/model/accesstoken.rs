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

//! The `AccessToken` data type.

use rand::Rng;
use ridehail_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum length of an access token, in characters.
const MIN_TOKEN_LENGTH: usize = 16;

/// Maximum length of an access token, in characters.
///
/// This is replicated in the database schema.
const MAX_TOKEN_LENGTH: usize = 512;

/// Length of the access tokens generated by `AccessToken::generate`.
const GENERATED_TOKEN_LENGTH: usize = 64;

/// An opaque type representing a caller's access token.
///
/// Access tokens are printable character sequences of bounded size.  Besides alphanumeric
/// characters, tokens can contain the characters that appear in signed tokens issued by external
/// login services (`.`, `-` and `_`).
#[derive(Clone, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new access token.
    pub fn new<S: Into<String>>(token: S) -> ModelResult<Self> {
        let token = token.into();
        if token.len() < MIN_TOKEN_LENGTH || token.len() > MAX_TOKEN_LENGTH {
            return Err(ModelError("Invalid access token".to_owned()));
        }
        for ch in token.chars() {
            if !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '_') {
                return Err(ModelError("Invalid access token".to_owned()));
            }
        }
        Ok(Self(token))
    }

    /// Generates a new random access token.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let token = (0..GENERATED_TOKEN_LENGTH)
            .map(|_| {
                let i = rng.random_range(0..(10 + 26 + 26));
                if i < 10 {
                    (b'0' + i) as char
                } else if i < 10 + 26 {
                    (b'a' + (i - 10)) as char
                } else {
                    (b'A' + (i - 10 - 26)) as char
                }
            })
            .collect();
        Self(token)
    }

    /// Returns the string representation of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed access token")
    }
}

impl TryFrom<String> for AccessToken {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        AccessToken::new(value)
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0
    }
}
