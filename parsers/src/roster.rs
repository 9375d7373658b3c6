// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::BareJid;
use xso::{AsXml, FromXml};

use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

generate_elem_id!(
    /// Represents a group a contact is part of.
    Group,
    "group",
    ROSTER
);

generate_attribute!(
    /// The state of your mutual subscription with a contact.
    Subscription, "subscription", {
        /// The user doesn't have any subscription to this contact’s
        /// presence, and neither does this contact.
        None => "none",

        /// Only this contact has a subscription with you, not the opposite.
        From => "from",

        /// Only you have a subscription with this contact, not the opposite.
        To => "to",

        /// Both you and your contact are subscribed to each other’s
        /// presence.
        Both => "both",

        /// In a roster set, this asks the server to remove this contact item
        /// from your roster.
        Remove => "remove",
    }, Default = None
);

generate_attribute!(
    /// The sub-state of subscription with a contact.
    Ask, "ask", (
        /// Pending sub-state of the 'none' subscription state.
        Subscribe => "subscribe"
    )
);

generate_attribute!(
    /// Whether a subscription from this contact was pre-approved.
    Approved, "approved", bool
);

/// Contact from the user’s contact list.
#[derive(FromXml, AsXml, Debug, Clone, PartialEq)]
#[xml(namespace = ns::ROSTER, name = "item")]
pub struct Item {
    /// JID of this contact.
    #[xml(attribute)]
    pub jid: BareJid,

    /// Name of this contact.
    #[xml(attribute(default))]
    pub name: Option<String>,

    /// Subscription status of this contact.
    #[xml(attribute(default))]
    pub subscription: Subscription,

    /// Indicates “Pending Out” sub-states for this contact.
    #[xml(attribute(default))]
    pub ask: Ask,

    /// Pre-approval of an inbound subscription request.
    #[xml(attribute(default))]
    pub approved: Approved,

    /// Groups this contact is part of.
    #[xml(child(n = ..))]
    pub groups: Vec<Group>,
}

impl Item {
    /// Creates a new item with no name, group, or subscription.
    pub fn new(jid: BareJid) -> Item {
        Item {
            jid,
            name: None,
            subscription: Subscription::None,
            ask: Ask::None,
            approved: Approved::False,
            groups: Vec::new(),
        }
    }
}

/// The contact list of the user.
#[derive(FromXml, AsXml, Debug, Clone, PartialEq, Default)]
#[xml(namespace = ns::ROSTER, name = "query")]
pub struct Roster {
    /// Version of the contact list.
    ///
    /// This is an opaque string that should only be sent back to the server on
    /// a new connection, if this client is storing the contact list between
    /// connections.
    #[xml(attribute(default))]
    pub ver: Option<String>,

    /// List of the contacts of the user.
    #[xml(child(n = ..))]
    pub items: Vec<Item>,
}

impl IqGetPayload for Roster {}
impl IqSetPayload for Roster {}
impl IqResultPayload for Roster {}

#[cfg(test)]
mod tests {
    use super::*;
    use minidom::Element;
    use std::str::FromStr;
    use xso::error::{Error, FromElementError};

    #[test]
    fn test_get() {
        let elem: Element = "<query xmlns='jabber:iq:roster'/>".parse().unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert!(roster.ver.is_none());
        assert!(roster.items.is_empty());
    }

    #[test]
    fn test_empty_ver_is_kept() {
        let elem: Element = "<query xmlns='jabber:iq:roster' ver=''/>".parse().unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert_eq!(roster.ver, Some(String::new()));

        let elem = Element::from(roster);
        assert_eq!(elem.attr("ver"), Some(""));
    }

    #[test]
    fn test_result() {
        let elem: Element = r#"<query xmlns='jabber:iq:roster' ver='ver7'>
  <item jid='nurse@example.com'/>
  <item jid='romeo@example.net' approved='true'/>
  <item jid='contact@example.org' subscription='both' name='My contact' ask='subscribe'>
    <group>Friends</group>
    <group>Friends/Close</group>
  </item>
</query>"#
            .parse()
            .unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert_eq!(roster.ver, Some(String::from("ver7")));
        assert_eq!(roster.items.len(), 3);
        assert_eq!(
            roster.items[0].jid,
            BareJid::new("nurse@example.com").unwrap()
        );
        assert!(roster.items[0].name.is_none());
        assert_eq!(roster.items[0].subscription, Subscription::None);
        assert_eq!(roster.items[0].approved, Approved::False);
        assert_eq!(roster.items[1].approved, Approved::True);

        let item = &roster.items[2];
        assert_eq!(item.name, Some(String::from("My contact")));
        assert_eq!(item.subscription, Subscription::Both);
        assert_eq!(item.ask, Ask::Subscribe);
        assert_eq!(
            item.groups,
            vec![
                Group::from_str("Friends").unwrap(),
                Group::from_str("Friends/Close").unwrap()
            ]
        );
    }

    #[test]
    fn test_remove() {
        let elem: Element = r#"<query xmlns='jabber:iq:roster'>
  <item jid='nurse@example.com' subscription='remove'/>
</query>"#
            .parse()
            .unwrap();
        let roster = Roster::try_from(elem).unwrap();
        assert_eq!(roster.items[0].subscription, Subscription::Remove);
    }

    #[test]
    fn test_empty_name_is_kept() {
        let elem: Element = "<item xmlns='jabber:iq:roster' jid='a@b' name=''/>"
            .parse()
            .unwrap();
        let item = Item::try_from(elem).unwrap();
        assert_eq!(item.name, Some(String::new()));
    }

    #[test]
    fn test_approved_numeric() {
        let elem: Element = "<item xmlns='jabber:iq:roster' jid='a@b' approved='1'/>"
            .parse()
            .unwrap();
        let item = Item::try_from(elem).unwrap();
        assert!(bool::from(item.approved));
    }

    #[test]
    fn test_serialise_item() {
        let mut item = Item::new(BareJid::new("juliet@example.com").unwrap());
        item.name = Some(String::from("Juliet"));
        item.subscription = Subscription::To;
        item.groups.push(Group(String::from("Family")));
        let elem = Element::from(item);
        assert_eq!(elem.attr("jid"), Some("juliet@example.com"));
        assert_eq!(elem.attr("name"), Some("Juliet"));
        assert_eq!(elem.attr("subscription"), Some("to"));
        assert_eq!(elem.attr("ask"), None);
        assert_eq!(elem.attr("approved"), None);
        let group = elem.get_child("group", ns::ROSTER).unwrap();
        assert_eq!(group.text(), "Family");
    }

    #[test]
    fn test_invalid() {
        let elem: Element = "<query xmlns='jabber:iq:roster'><coucou/></query>"
            .parse()
            .unwrap();
        let error = Roster::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Unknown child in Roster element.");

        let elem: Element = "<item xmlns='jabber:iq:roster'/>".parse().unwrap();
        let error = Item::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Required attribute field 'jid' on Item element missing.");
    }
}
