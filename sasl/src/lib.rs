// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(missing_docs)]

//! This crate provides a framework for SASL authentication and a few
//! client-side mechanisms.
//!
//! # Examples
//!
//! ```rust
//! use sasl::client::Mechanism;
//! use sasl::client::mechanisms::Plain;
//! use sasl::common::Credentials;
//!
//! let creds = Credentials::default()
//!     .with_username("user")
//!     .with_password("pencil");
//!
//! let mut mechanism = Plain::from_credentials(creds).unwrap();
//!
//! let initial_data = mechanism.initial();
//!
//! assert_eq!(initial_data, b"\0user\0pencil");
//! ```
//!
//! # Usage
//!
//! You can use this in your crate by adding this under `dependencies` in your `Cargo.toml`:
//!
//! ```toml,ignore
//! sasl = "*"
//! ```

/// Client-side mechanisms.
pub mod client;
/// Credentials and the helpers shared by the mechanisms.
pub mod common;
