// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use std::collections::BTreeSet;

use tokio_xmpp::jid::BareJid;
use tokio_xmpp::parsers::roster::{Ask, Group, Item, Subscription};

/// A roster entry.
///
/// Contacts are values: a change on the server gives a new `Contact`.
/// They sort by name, then subscription, then pending request, and finally
/// by JID. Group membership is a set, the order of `groups` is not compared.
#[derive(Debug, Clone)]
pub struct Contact {
    /// Address of the contact, unique in a roster.
    pub jid: BareJid,
    /// Name the user gave to the contact.
    pub name: Option<String>,
    /// Full names of the groups the contact is in.
    pub groups: Vec<String>,
    /// Subscription state, [`Subscription::Remove`] only in a roster push.
    pub subscription: Subscription,
    /// The user asked for a subscription which wasn't answered yet.
    pub pending_out: bool,
    /// A subscription from the contact will be approved automatically.
    pub approved: bool,
}

impl Contact {
    /// A contact without name, group or subscription.
    pub fn new(jid: BareJid) -> Contact {
        Contact {
            jid,
            name: None,
            groups: Vec::new(),
            subscription: Subscription::None,
            pending_out: false,
            approved: false,
        }
    }

    /// Set the name of this contact.
    pub fn with_name<N: Into<String>>(mut self, name: N) -> Contact {
        self.name = Some(name.into());
        self
    }

    /// Add this contact to a group.
    pub fn with_group<G: Into<String>>(mut self, group: G) -> Contact {
        self.groups.push(group.into());
        self
    }

    /// Set the subscription state of this contact.
    pub fn with_subscription(mut self, subscription: Subscription) -> Contact {
        self.subscription = subscription;
        self
    }

    fn group_set(&self) -> BTreeSet<&str> {
        self.groups.iter().map(String::as_str).collect()
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.jid == other.jid
            && self.name == other.name
            && self.subscription == other.subscription
            && self.pending_out == other.pending_out
            && self.approved == other.approved
            && self.group_set() == other.group_set()
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.jid.hash(state);
        self.name.hash(state);
        self.subscription.hash(state);
        self.pending_out.hash(state);
        self.approved.hash(state);
        self.group_set().hash(state);
    }
}

fn subscription_rank(subscription: Subscription) -> u8 {
    match subscription {
        Subscription::None => 0,
        Subscription::To => 1,
        Subscription::From => 2,
        Subscription::Both => 3,
        Subscription::Remove => 4,
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| {
                subscription_rank(self.subscription).cmp(&subscription_rank(other.subscription))
            })
            .then_with(|| self.pending_out.cmp(&other.pending_out))
            .then_with(|| self.jid.as_str().cmp(other.jid.as_str()))
            .then_with(|| self.group_set().cmp(&other.group_set()))
            .then_with(|| self.approved.cmp(&other.approved))
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Item> for Contact {
    fn from(item: Item) -> Contact {
        Contact {
            jid: item.jid,
            name: item.name.filter(|name| !name.is_empty()),
            groups: item.groups.into_iter().map(|group| group.0).collect(),
            subscription: item.subscription,
            pending_out: item.ask == Ask::Subscribe,
            approved: item.approved.into(),
        }
    }
}

impl From<Contact> for Item {
    fn from(contact: Contact) -> Item {
        Item {
            jid: contact.jid,
            name: contact.name,
            subscription: contact.subscription,
            ask: if contact.pending_out {
                Ask::Subscribe
            } else {
                Ask::None
            },
            approved: contact.approved.into(),
            groups: contact.groups.into_iter().map(Group).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_xmpp::minidom::Element;

    #[test]
    fn from_item() {
        let elem: Element = "<item xmlns='jabber:iq:roster' jid='romeo@example.net' name='Romeo' subscription='none' ask='subscribe' approved='true'><group>Friends</group></item>"
            .parse()
            .unwrap();
        let contact = Contact::from(Item::try_from(elem).unwrap());
        assert_eq!(contact.name.as_deref(), Some("Romeo"));
        assert_eq!(contact.groups, vec![String::from("Friends")]);
        assert!(contact.pending_out);
        assert!(contact.approved);

        let item = Item::from(contact);
        assert_eq!(item.ask, Ask::Subscribe);
        assert_eq!(item.groups, vec![Group(String::from("Friends"))]);
    }

    #[test]
    fn empty_name_is_none() {
        let elem: Element = "<item xmlns='jabber:iq:roster' jid='romeo@example.net' name=''/>"
            .parse()
            .unwrap();
        let contact = Contact::from(Item::try_from(elem).unwrap());
        assert!(contact.name.is_none());
        assert!(!contact.approved);
    }

    #[test]
    fn group_order_is_ignored() {
        let jid = BareJid::new("romeo@example.net").unwrap();
        let a = Contact::new(jid.clone())
            .with_group("Friends")
            .with_group("Work");
        let b = Contact::new(jid).with_group("Work").with_group("Friends");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn ordering() {
        let jid = |s: &str| BareJid::new(s).unwrap();
        let mut contacts = vec![
            Contact::new(jid("c@example.net")).with_name("Mercutio"),
            Contact::new(jid("b@example.net"))
                .with_name("Benvolio")
                .with_subscription(Subscription::Both),
            Contact::new(jid("a@example.net")).with_name("Benvolio"),
            Contact::new(jid("d@example.net")),
        ];
        contacts.sort();
        let order: Vec<_> = contacts.iter().map(|c| c.jid.to_string()).collect();
        assert_eq!(
            order,
            ["d@example.net", "a@example.net", "b@example.net", "c@example.net"]
        );
    }
}
