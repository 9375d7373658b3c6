// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::roster::Contact;

/// Changes to the roster caused by one snapshot or push.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterEvent {
    /// Contacts which were not in the roster before.
    pub added: Vec<Contact>,
    /// Contacts which changed, in their new version.
    pub updated: Vec<Contact>,
    /// Contacts which left the roster, in their last version.
    pub removed: Vec<Contact>,
}

impl RosterEvent {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}
