// Copyright (c) 2017-2018 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XML namespaces used by the elements of this crate.

/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub const DEFAULT_NS: &str = "jabber:client";

/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub const STREAM: &str = "http://etherx.jabber.org/streams";

/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";

/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// RFC 6121: Extensible Messaging and Presence Protocol (XMPP): Instant Messaging and Presence
pub const ROSTER: &str = "jabber:iq:roster";

/// RFC 6121: Roster versioning stream feature
pub const ROSTER_VER: &str = "urn:xmpp:features:rosterver";

/// XEP-0049: Private XML Storage
pub const PRIVATE: &str = "jabber:iq:private";

/// XEP-0083: Nested Roster Groups
pub const ROSTER_DELIMITER: &str = "roster:delimiter";
