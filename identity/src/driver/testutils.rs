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

//! Utilities to help testing services that integrate with the identity provider.

use crate::db;
#[cfg(test)]
use crate::driver::{IdentityDriver, IdentityOptions};
use crate::model::{AccessToken, Identity, Session};
use ridehail_core::clocks::Clock;
#[cfg(test)]
use ridehail_core::clocks::testutils::SettableClock;
use ridehail_core::db::Db;
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use time::OffsetDateTime;
#[cfg(test)]
use time::macros::datetime;

/// Registers a new session for `identity` that started at the current time of `clock` and
/// returns its access token.
pub async fn login_as(db: &dyn Db, clock: &dyn Clock, identity: Identity) -> AccessToken {
    let token = AccessToken::generate();
    let session = Session::new(token.clone(), identity, clock.now_utc());
    db::put_session(&mut db.ex().await.unwrap(), &session).await.unwrap();
    token
}

/// State of a running test.
#[cfg(test)]
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver, which tests can move at will.
    pub(crate) clock: Arc<SettableClock>,

    /// The time at which the clock starts and thus when sessions are created.
    pub(crate) login_time: OffsetDateTime,

    /// The driver under test.
    driver: IdentityDriver,
}

#[cfg(test)]
impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub(crate) async fn setup(opts: IdentityOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(ridehail_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let login_time = datetime!(2024-06-01 08:00:00 UTC);
        let clock = Arc::from(SettableClock::new(login_time));

        let driver = IdentityDriver::new(db.clone(), clock.clone(), opts);
        Self { db, clock, login_time, driver }
    }

    /// Creates a session for `identity` at the current time.
    pub(crate) async fn login(&self, identity: Identity) -> AccessToken {
        login_as(self.db.as_ref(), self.clock.as_ref(), identity).await
    }

    /// Registers a session with a caller-chosen `token` for `identity` at the current time.
    pub(crate) async fn put_session(&self, token: AccessToken, identity: Identity) {
        let session = Session::new(token, identity, self.clock.now_utc());
        db::put_session(&mut self.db.ex().await.unwrap(), &session).await.unwrap();
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> IdentityDriver {
        self.driver.clone()
    }

    /// Releases the database.
    pub(crate) async fn close(self) {
        drop(self.driver);
        self.db.close().await;
    }
}
