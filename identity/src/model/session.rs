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

//! The `Session` data type.

use crate::model::{AccessToken, Identity};
use time::OffsetDateTime;

/// Represents an authenticated session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// The access token for the session, which acts as its identifier.
    access_token: AccessToken,

    /// The principal that owns this session.
    identity: Identity,

    /// Timestamp to represent when the session was initiated.
    login_time: OffsetDateTime,
}

impl Session {
    /// Creates a new session from its parts.
    pub fn new(access_token: AccessToken, identity: Identity, login_time: OffsetDateTime) -> Self {
        Self { access_token, identity, login_time }
    }

    /// Returns the session's access token.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the session's owner.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Returns the session's login time.
    pub fn login_time(&self) -> OffsetDateTime {
        self.login_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DriverId;
    use time::macros::datetime;

    #[test]
    fn test_session() {
        let token = AccessToken::generate();
        let identity = Identity::Driver(DriverId::from(3));
        let login_time = datetime!(2024-05-17 06:46:53 UTC);
        let session = Session::new(token.clone(), identity, login_time);
        assert_eq!(&token, session.access_token());
        assert_eq!(identity, session.identity());
        assert_eq!(login_time, session.login_time());
    }
}
