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

//! Database tests shared by all implementations.

use crate::db::{get_session, init_schema, put_session};
use crate::model::{AccessToken, DriverId, Identity, Session, UserId};
use ridehail_core::db::{Db, DbError};
use std::sync::Arc;
use time::macros::datetime;

async fn test_sessions_put_and_get(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    init_schema(&mut ex).await.unwrap();

    let session1 = Session::new(
        AccessToken::generate(),
        Identity::User(UserId::from(1)),
        datetime!(2024-06-01 10:00:00.123456 UTC),
    );
    let session2 = Session::new(
        AccessToken::generate(),
        Identity::Driver(DriverId::from(1)),
        datetime!(2024-06-01 11:00:00 UTC),
    );
    put_session(&mut ex, &session1).await.unwrap();
    put_session(&mut ex, &session2).await.unwrap();

    assert_eq!(session1, get_session(&mut ex, session1.access_token()).await.unwrap());
    assert_eq!(session2, get_session(&mut ex, session2.access_token()).await.unwrap());

    drop(ex);
    db.close().await;
}

async fn test_sessions_get_not_found(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    init_schema(&mut ex).await.unwrap();

    assert_eq!(DbError::NotFound, get_session(&mut ex, &AccessToken::generate()).await.unwrap_err());

    drop(ex);
    db.close().await;
}

async fn test_sessions_put_duplicate(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    init_schema(&mut ex).await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        Identity::Driver(DriverId::from(8)),
        datetime!(2024-06-01 10:00:00 UTC),
    );
    put_session(&mut ex, &session).await.unwrap();
    assert_eq!(DbError::AlreadyExists, put_session(&mut ex, &session).await.unwrap_err());

    drop(ex);
    db.close().await;
}

async fn test_sessions_init_schema_is_idempotent(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();
    init_schema(&mut ex).await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        Identity::User(UserId::from(4)),
        datetime!(2024-06-01 10:00:00 UTC),
    );
    put_session(&mut ex, &session).await.unwrap();

    init_schema(&mut ex).await.unwrap();
    assert_eq!(session, get_session(&mut ex, session.access_token()).await.unwrap());

    drop(ex);
    db.close().await;
}

macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta])? ) => {
        ridehail_core::db::testutils::generate_tests!(
            $( #[$extra], )?
            $setup,
            $crate::db::tests,
            test_sessions_put_and_get,
            test_sessions_get_not_found,
            test_sessions_put_duplicate,
            test_sessions_init_schema_is_idempotent
        );
    }
];

mod sqlite {
    use super::*;
    use ridehail_core::db::sqlite::testutils::setup;

    generate_db_tests!(Arc::new(setup().await));
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use ridehail_core::db::postgres::testutils::setup;

    generate_db_tests!(
        Arc::new(setup().await),
        #[ignore = "Requires environment configuration and is expensive"]
    );
}
