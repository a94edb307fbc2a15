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

//! Business logic to resolve access tokens into identities.

use crate::db;
use crate::model::{AccessToken, Identity};
use derivative::Derivative;
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use ridehail_core::clocks::Clock;
use ridehail_core::db::{Db, DbError};
use ridehail_core::driver::{DriverError, DriverResult};
use ridehail_core::env::get_optional_var;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

/// Default number of sessions to keep cached in memory.
const DEFAULT_SESSIONS_CACHE_CAPACITY: usize = 10 * 1024;

/// Default amount of time to keep cached sessions in memory.
const DEFAULT_SESSIONS_CACHE_TTL_SECONDS: u64 = 60;

/// Default value for the `SESSION_MAX_AGE` setting when not specified.
const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 2 * 60 * 60;

/// Default value for the `SESSION_MAX_SKEW` setting when not specified.
const DEFAULT_SESSION_MAX_SKEW_SECONDS: u64 = 60 * 60;

/// Configuration options for the identity driver.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct IdentityOptions {
    /// The number of sessions to keep cached in memory.
    pub sessions_cache_capacity: usize,

    /// The amount of time to keep cached sessions in memory.
    pub sessions_cache_ttl: Duration,

    /// The amount of time we consider sessions valid for.
    pub session_max_age: Duration,

    /// The amount of time we tolerate in clock skew when validating sessions.  We should never see
    /// this, except if the login service and this service run on machines whose clocks aren't
    /// properly synchronized.
    pub session_max_skew: Duration,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            sessions_cache_capacity: DEFAULT_SESSIONS_CACHE_CAPACITY,
            sessions_cache_ttl: Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS),
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS),
            session_max_skew: Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS),
        }
    }
}

impl IdentityOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            sessions_cache_capacity: get_optional_var::<usize>(prefix, "SESSIONS_CACHE_CAPACITY")?
                .unwrap_or(DEFAULT_SESSIONS_CACHE_CAPACITY),
            sessions_cache_ttl: get_optional_var::<Duration>(prefix, "SESSIONS_CACHE_TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS)),
            session_max_age: get_optional_var::<Duration>(prefix, "SESSION_MAX_AGE")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS)),
            session_max_skew: get_optional_var::<Duration>(prefix, "SESSION_MAX_SKEW")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS)),
        })
    }
}

/// Business logic for the identity provider.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct IdentityDriver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Options for the identity driver.
    opts: IdentityOptions,

    /// Cache of resolved sessions.
    sessions_cache: Arc<Mutex<LruCache<AccessToken, DriverResult<Identity>>>>,
}

impl IdentityDriver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        opts: IdentityOptions,
    ) -> Self {
        let sessions_cache = LruCache::with_expiry_duration_and_capacity(
            opts.sessions_cache_ttl,
            opts.sessions_cache_capacity,
        );
        let sessions_cache = Arc::from(Mutex::from(sessions_cache));

        Self { db, clock, opts, sessions_cache }
    }

    /// Looks up the session identified by `token`, validates it against `now` and returns the
    /// identity that owns the session.
    ///
    /// This is an internal helper for `get_identity` that does not perform any caching.
    async fn get_identity_uncached(
        &self,
        now: OffsetDateTime,
        token: &AccessToken,
    ) -> DriverResult<Identity> {
        let session = match db::get_session(&mut self.db.ex().await?, token).await {
            Ok(session) => session,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        let login_time = session.login_time();
        let expired = login_time < (now - self.opts.session_max_age);
        let skew = login_time > (now + self.opts.session_max_skew);
        if expired || skew {
            return Err(DriverError::Unauthorized(
                "Session expired; please log in again".to_owned(),
            ));
        }

        Ok(session.identity())
    }

    /// Resolves `token` into the identity that owns it.
    ///
    /// Both OK and authentication error results come from an internal cache, which should have
    /// been configured to evict entries relatively quickly.  Backend errors are never cached.
    pub async fn get_identity(&self, token: AccessToken) -> DriverResult<Identity> {
        {
            let mut cache = self.sessions_cache.lock().await;
            if let Some(result) = cache.get(&token) {
                return result.clone();
            }
        }

        let result = self.get_identity_uncached(self.clock.now_utc(), &token).await;
        if let Err(DriverError::BackendError(_)) = result {
            return result;
        }

        let mut cache = self.sessions_cache.lock().await;
        if let Some(old_result) = cache.insert(token, result.clone()) {
            if old_result != result {
                warn!(
                    "Cache insertion race detected with inconsistent values: {:?} != {:?}",
                    old_result, result
                );
            }
        }

        result
    }
}
