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

//! Entry point to the ride-hailing service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use ridehail::db::init_schema;
use ridehail::serve;
use ridehail_core::db::{Db, DbResult};
use ridehail_core::db::postgres::{PostgresDb, PostgresOptions};
use ridehail_identity::driver::IdentityOptions;
use std::env;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Port to listen on when `PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

/// Creates the tables of the identity provider and of the service if they don't exist yet.
async fn init_schemas(db: &(dyn Db + Send + Sync)) -> DbResult<()> {
    let mut ex = db.ex().await?;
    ridehail_identity::db::init_schema(&mut ex).await?;
    init_schema(&mut ex).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let port: u16 = match env::var("PORT") {
        Ok(val) => val.parse::<u16>().map_err(|e| format!("Invalid PORT '{}': {}", val, e))?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = (Ipv4Addr::UNSPECIFIED, port);

    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let identity_opts = IdentityOptions::from_env("IDENTITY")?;

    let db: Arc<dyn Db + Send + Sync> = Arc::new(PostgresDb::connect(db_opts)?);
    if let Err(e) = init_schemas(db.as_ref()).await {
        db.close().await;
        return Err(e.into());
    }

    serve(addr, db, identity_opts).await
}
