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

//! Identity provider for the ride-hailing services.
//!
//! Callers authenticate by presenting a bearer access token that identifies a previously-issued
//! session.  Sessions bind the token to either a rider or a driver and expire after a configurable
//! amount of time.  Issuing sessions is the job of an external login service, so this crate only
//! knows how to store them and how to resolve them back into an `Identity`.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod model;
pub mod rest;
