// Copyright (c) 2017-2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2017 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A crate parsing the XMPP elements needed by the SASL negotiation and
//! roster management of a client, and serialising them back.
//!
//! Most elements derive their conversions with [`xso`], which provides a
//! `TryFrom<Element>` and a `From<T> for Element` implementation for each of
//! them. Stanza-level types keep hand-written conversions.

#![warn(missing_docs)]

pub use xso::error::{Error, FromElementError};
pub use jid;
pub use minidom;
pub use minidom::Element;

#[macro_use]
mod util;

/// XML namespace definitions used through XMPP.
pub mod ns;

/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod iq;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod presence;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod sasl;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod stanza_error;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod stream_features;

/// RFC 6121: Extensible Messaging and Presence Protocol (XMPP): Instant Messaging and Presence
pub mod roster;

/// XEP-0049: Private XML Storage, XEP-0083: Nested Roster Groups
pub mod private;
