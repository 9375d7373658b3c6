// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Presence subscription states of RFC 6121, Appendix A.

use core::fmt;
use core::str::FromStr;

use tokio_xmpp::parsers::{presence::Type as PresenceType, roster::Subscription};

/// One of the nine defined subscription states between the user and a
/// contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinedState {
    /// No subscription in either direction, nothing pending.
    None,
    /// The user asked for a subscription to the contact.
    NonePendingOut,
    /// The contact asked for a subscription to the user.
    NonePendingIn,
    /// Both asked, neither approved yet.
    NonePendingOutIn,
    /// The user is subscribed to the contact.
    To,
    /// The user is subscribed to the contact, who asked for a subscription.
    ToPendingIn,
    /// The contact is subscribed to the user.
    From,
    /// The contact is subscribed to the user, who asked for a subscription.
    FromPendingOut,
    /// Mutual subscription.
    Both,
}

/// Whether a subscription presence is sent by the user or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sent by the user to the contact.
    Outbound,
    /// Received by the user from the contact.
    Inbound,
}

/// The presence types which change a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionEvent {
    /// Request a subscription.
    Subscribe,
    /// Cancel a subscription.
    Unsubscribe,
    /// Approve a subscription request.
    Subscribed,
    /// Deny a subscription request, or revoke a subscription.
    Unsubscribed,
}

/// A presence type which doesn't affect subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotASubscriptionEvent(pub String);

impl fmt::Display for NotASubscriptionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a subscription presence type", self.0)
    }
}

impl std::error::Error for NotASubscriptionEvent {}

impl FromStr for SubscriptionEvent {
    type Err = NotASubscriptionEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "subscribe" => SubscriptionEvent::Subscribe,
            "unsubscribe" => SubscriptionEvent::Unsubscribe,
            "subscribed" => SubscriptionEvent::Subscribed,
            "unsubscribed" => SubscriptionEvent::Unsubscribed,
            _ => return Err(NotASubscriptionEvent(s.to_owned())),
        })
    }
}

impl TryFrom<PresenceType> for SubscriptionEvent {
    type Error = NotASubscriptionEvent;

    fn try_from(type_: PresenceType) -> Result<Self, Self::Error> {
        Ok(match type_ {
            PresenceType::Subscribe => SubscriptionEvent::Subscribe,
            PresenceType::Unsubscribe => SubscriptionEvent::Unsubscribe,
            PresenceType::Subscribed => SubscriptionEvent::Subscribed,
            PresenceType::Unsubscribed => SubscriptionEvent::Unsubscribed,
            other => return Err(NotASubscriptionEvent(format!("{:?}", other).to_lowercase())),
        })
    }
}

impl From<SubscriptionEvent> for PresenceType {
    fn from(event: SubscriptionEvent) -> PresenceType {
        match event {
            SubscriptionEvent::Subscribe => PresenceType::Subscribe,
            SubscriptionEvent::Unsubscribe => PresenceType::Unsubscribe,
            SubscriptionEvent::Subscribed => PresenceType::Subscribed,
            SubscriptionEvent::Unsubscribed => PresenceType::Unsubscribed,
        }
    }
}

impl DefinedState {
    /// Derive the state from a roster subscription and the pending flags.
    ///
    /// A pending flag in a direction which is already subscribed is
    /// meaningless and ignored. Returns `None` for [`Subscription::Remove`].
    pub fn from_parts(
        subscription: Subscription,
        pending_out: bool,
        pending_in: bool,
    ) -> Option<DefinedState> {
        use DefinedState::*;
        Some(match (subscription, pending_out, pending_in) {
            (Subscription::None, false, false) => None,
            (Subscription::None, true, false) => NonePendingOut,
            (Subscription::None, false, true) => NonePendingIn,
            (Subscription::None, true, true) => NonePendingOutIn,
            (Subscription::To, _, false) => To,
            (Subscription::To, _, true) => ToPendingIn,
            (Subscription::From, false, _) => From,
            (Subscription::From, true, _) => FromPendingOut,
            (Subscription::Both, _, _) => Both,
            (Subscription::Remove, _, _) => return Option::None,
        })
    }

    /// The roster subscription value of this state.
    pub fn subscription(self) -> Subscription {
        use DefinedState::*;
        match self {
            None | NonePendingOut | NonePendingIn | NonePendingOutIn => Subscription::None,
            To | ToPendingIn => Subscription::To,
            From | FromPendingOut => Subscription::From,
            Both => Subscription::Both,
        }
    }

    /// Whether the user has an unanswered subscription request.
    pub fn is_pending_out(self) -> bool {
        use DefinedState::*;
        matches!(self, NonePendingOut | NonePendingOutIn | FromPendingOut)
    }

    /// Whether the contact has an unanswered subscription request.
    pub fn is_pending_in(self) -> bool {
        use DefinedState::*;
        matches!(self, NonePendingIn | NonePendingOutIn | ToPendingIn)
    }

    /// The state after the user sent `event` to the contact.
    pub fn on_outbound(self, event: SubscriptionEvent) -> DefinedState {
        use DefinedState::*;
        use SubscriptionEvent::*;
        match (self, event) {
            (None, Subscribe) => NonePendingOut,
            (NonePendingIn, Subscribe) => NonePendingOutIn,
            (From, Subscribe) => FromPendingOut,

            (NonePendingOut, Unsubscribe) => None,
            (NonePendingOutIn, Unsubscribe) => NonePendingIn,
            (To, Unsubscribe) => None,
            (ToPendingIn, Unsubscribe) => NonePendingIn,
            (FromPendingOut, Unsubscribe) => From,
            (Both, Unsubscribe) => From,

            (NonePendingIn, Subscribed) => From,
            (NonePendingOutIn, Subscribed) => FromPendingOut,
            (ToPendingIn, Subscribed) => Both,

            (NonePendingIn, Unsubscribed) => None,
            (NonePendingOutIn, Unsubscribed) => NonePendingOut,
            (ToPendingIn, Unsubscribed) => To,
            (From, Unsubscribed) => None,
            (FromPendingOut, Unsubscribed) => NonePendingOut,
            (Both, Unsubscribed) => To,

            (state, _) => state,
        }
    }

    /// The state after the user received `event` from the contact.
    pub fn on_inbound(self, event: SubscriptionEvent) -> DefinedState {
        use DefinedState::*;
        use SubscriptionEvent::*;
        match (self, event) {
            (None, Subscribe) => NonePendingIn,
            (NonePendingOut, Subscribe) => NonePendingOutIn,
            (To, Subscribe) => ToPendingIn,

            (NonePendingIn, Unsubscribe) => None,
            (NonePendingOutIn, Unsubscribe) => NonePendingOut,
            (ToPendingIn, Unsubscribe) => To,
            (From, Unsubscribe) => None,
            (FromPendingOut, Unsubscribe) => NonePendingOut,
            (Both, Unsubscribe) => To,

            (NonePendingOut, Subscribed) => To,
            (NonePendingOutIn, Subscribed) => ToPendingIn,
            (FromPendingOut, Subscribed) => Both,

            (NonePendingOut, Unsubscribed) => None,
            (NonePendingOutIn, Unsubscribed) => NonePendingIn,
            (To, Unsubscribed) => None,
            (ToPendingIn, Unsubscribed) => NonePendingIn,
            (FromPendingOut, Unsubscribed) => From,
            // RFC 6121 A.3.4 goes to FROM here.
            (Both, Unsubscribed) => To,

            (state, _) => state,
        }
    }

    /// Apply `event` in the given direction.
    pub fn transition(self, direction: Direction, event: SubscriptionEvent) -> DefinedState {
        match direction {
            Direction::Outbound => self.on_outbound(event),
            Direction::Inbound => self.on_inbound(event),
        }
    }
}
