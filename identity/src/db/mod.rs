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

//! Database abstraction to store and look up sessions.

use crate::model::{AccessToken, Identity, Role, Session};
#[cfg(feature = "postgres")]
use ridehail_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use ridehail_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use ridehail_core::db::{DbError, DbResult, Executor};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
#[cfg(feature = "postgres")]
use time::OffsetDateTime;

#[cfg(test)]
mod tests;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Session {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(postgres::map_sqlx_error)?;
        let role: String = row.try_get("role").map_err(postgres::map_sqlx_error)?;
        let subject_id: i64 = row.try_get("subject_id").map_err(postgres::map_sqlx_error)?;
        let login_time: OffsetDateTime =
            row.try_get("login_time").map_err(postgres::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let identity = Identity::from_parts(Role::parse(&role)?, subject_id);

        Ok(Session::new(access_token, identity, login_time))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Session {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(sqlite::map_sqlx_error)?;
        let role: String = row.try_get("role").map_err(sqlite::map_sqlx_error)?;
        let subject_id: i64 = row.try_get("subject_id").map_err(sqlite::map_sqlx_error)?;
        let login_time_secs: i64 =
            row.try_get("login_time_secs").map_err(sqlite::map_sqlx_error)?;
        let login_time_nsecs: i64 =
            row.try_get("login_time_nsecs").map_err(sqlite::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let identity = Identity::from_parts(Role::parse(&role)?, subject_id);
        let login_time = build_timestamp(login_time_secs, login_time_nsecs)?;

        Ok(Session::new(access_token, identity, login_time))
    }
}

/// Gets a session from its access token.
pub async fn get_session(ex: &mut Executor, access_token: &AccessToken) -> DbResult<Session> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT access_token, role, subject_id, login_time
                FROM sessions
                WHERE access_token = $1";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Session::try_from(raw_session)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT access_token, role, subject_id, login_time_secs, login_time_nsecs
                FROM sessions
                WHERE access_token = ?";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Session::try_from(raw_session)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Saves a session.
///
/// Sessions are issued by an external login service; this is the entry point that service (and
/// tests) use to make a session known to the identity provider.
pub async fn put_session(ex: &mut Executor, session: &Session) -> DbResult<()> {
    let identity = session.identity();
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO sessions (access_token, role, subject_id, login_time)
                VALUES ($1, $2, $3, $4)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(identity.role().as_str())
                .bind(identity.id())
                .bind(session.login_time())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (login_time_secs, login_time_nsecs) = unpack_timestamp(session.login_time());

            let query_str = "
                INSERT INTO sessions
                    (access_token, role, subject_id, login_time_secs, login_time_nsecs)
                VALUES (?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(identity.role().as_str())
                .bind(identity.id())
                .bind(login_time_secs)
                .bind(login_time_nsecs)
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}
