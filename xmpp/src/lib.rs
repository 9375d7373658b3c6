// Copyright (c) 2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! High-level client state on top of [`tokio_xmpp`]: the roster with its
//! nested groups and the presence subscription states.

#![deny(bare_trait_objects)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use tokio_xmpp;
pub use tokio_xmpp::jid;
pub use tokio_xmpp::minidom;
pub use tokio_xmpp::parsers;

#[macro_use]
extern crate log;

pub mod error;
pub mod event;
pub mod roster;
pub mod subscription;

pub use error::Error;
pub use event::RosterEvent;
pub use roster::{Contact, ContactGroup, RosterManager, RosterSettings};
pub use subscription::{DefinedState, Direction, SubscriptionEvent};
