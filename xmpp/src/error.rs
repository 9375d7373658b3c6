// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;
use std::error::Error as StdError;

/// Errors of the high-level client state.
#[derive(Debug)]
pub enum Error {
    /// Error from the connection, the stream or a peer
    Connection(tokio_xmpp::Error),
    /// A group name was empty or contained the group delimiter
    InvalidGroupName(String),
    /// No group with this full name exists in the roster
    GroupNotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(fmt, "{}", e),
            Error::InvalidGroupName(name) => write!(fmt, "invalid group name: {:?}", name),
            Error::GroupNotFound(name) => write!(fmt, "group not found: {}", name),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Connection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tokio_xmpp::Error> for Error {
    fn from(e: tokio_xmpp::Error) -> Self {
        Error::Connection(e)
    }
}

impl From<tokio_xmpp::parsers::FromElementError> for Error {
    fn from(e: tokio_xmpp::parsers::FromElementError) -> Self {
        Error::Connection(e.into())
    }
}
