// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2017 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;
use std::collections::BTreeMap;

use jid::Jid;
use minidom::Element;
use xso::{error::Error, AsOptionalXmlText, AsXml, FromXml, FromXmlText};

use crate::ns;

type Lang = String;
type Status = String;

/// Accepted values for the 'type' attribute of a presence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// This value is not an acceptable 'type' attribute, it is only used
    /// internally to signal the absence of 'type'.
    #[default]
    None,

    /// An error has occurred regarding processing of a previously sent
    /// presence stanza.
    Error,

    /// A request for an entity's current presence.
    Probe,

    /// The sender wishes to subscribe to the recipient's presence.
    Subscribe,

    /// The sender has allowed the recipient to receive their presence.
    Subscribed,

    /// The sender is no longer available for communication.
    Unavailable,

    /// The sender is unsubscribing from the receiver's presence.
    Unsubscribe,

    /// The subscription request has been denied or a previously granted
    /// subscription has been canceled.
    Unsubscribed,
}

impl FromXmlText for Type {
    fn from_xml_text(s: String) -> Result<Type, Error> {
        Ok(match s.as_ref() {
            "error" => Type::Error,
            "probe" => Type::Probe,
            "subscribe" => Type::Subscribe,
            "subscribed" => Type::Subscribed,
            "unavailable" => Type::Unavailable,
            "unsubscribe" => Type::Unsubscribe,
            "unsubscribed" => Type::Unsubscribed,

            _ => {
                return Err(Error::Other(
                    "Invalid 'type' attribute on presence element.",
                ));
            }
        })
    }
}

impl AsOptionalXmlText for Type {
    fn as_optional_xml_text(&self) -> Result<Option<Cow<'_, str>>, Error> {
        Ok(Some(Cow::Borrowed(match self {
            Type::None => return Ok(None),

            Type::Error => "error",
            Type::Probe => "probe",
            Type::Subscribe => "subscribe",
            Type::Subscribed => "subscribed",
            Type::Unavailable => "unavailable",
            Type::Unsubscribe => "unsubscribe",
            Type::Unsubscribed => "unsubscribed",
        })))
    }
}

/// The main structure representing the `<presence/>` stanza.
#[derive(FromXml, AsXml, Debug, Clone, PartialEq)]
#[xml(namespace = ns::DEFAULT_NS, name = "presence")]
pub struct Presence {
    /// The sender of this presence.
    #[xml(attribute(default))]
    pub from: Option<Jid>,

    /// The recipient of this presence.
    #[xml(attribute(default))]
    pub to: Option<Jid>,

    /// The identifier, unique on this stream, of this stanza.
    #[xml(attribute(default))]
    pub id: Option<String>,

    /// The type of this presence stanza.
    #[xml(attribute(default))]
    pub type_: Type,

    /// A localised list of statuses defined in this presence.
    #[xml(extract(n = .., name = "status", fields(
        attribute(type_ = String, name = "xml:lang", default),
        text(type_ = String),
    )))]
    pub statuses: BTreeMap<Lang, Status>,

    /// A list of payloads contained in this presence.
    #[xml(element(n = ..))]
    pub payloads: Vec<Element>,
}

impl Presence {
    /// Create a new presence of this type.
    pub fn new(type_: Type) -> Presence {
        Presence {
            from: None,
            to: None,
            id: None,
            type_,
            statuses: BTreeMap::new(),
            payloads: vec![],
        }
    }

    /// Set the emitter of this presence, this should only be useful for
    /// servers and components, as clients can only send presences from their
    /// own resource (which is implicit).
    pub fn with_from<J: Into<Jid>>(mut self, from: J) -> Presence {
        self.from = Some(from.into());
        self
    }

    /// Set the recipient of this presence.
    pub fn with_to<J: Into<Jid>>(mut self, to: J) -> Presence {
        self.to = Some(to.into());
        self
    }

    /// Set the identifier for this presence.
    pub fn with_id(mut self, id: String) -> Presence {
        self.id = Some(id);
        self
    }

    /// Set a status in this presence, with an empty language.
    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.statuses.insert(Lang::new(), status.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jid::BareJid;
    use xso::error::FromElementError;

    #[test]
    fn test_subscribe() {
        let elem: Element = "<presence xmlns='jabber:client' type='subscribe' from='romeo@example.net'/>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.type_, Type::Subscribe);
        assert_eq!(presence.from, Some(Jid::new("romeo@example.net").unwrap()));
        assert!(presence.statuses.is_empty());
    }

    #[test]
    fn test_available() {
        let elem: Element = "<presence xmlns='jabber:client'/>".parse().unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.type_, Type::None);
    }

    #[test]
    fn test_invalid_type() {
        let elem: Element = "<presence xmlns='jabber:client' type='coucou'/>"
            .parse()
            .unwrap();
        let error = Presence::try_from(elem).unwrap_err();
        assert!(error
            .to_string()
            .contains("Invalid 'type' attribute on presence element."));
    }

    #[test]
    fn test_serialise_with_status() {
        let mut presence = Presence::new(Type::Subscribe)
            .with_to(BareJid::new("juliet@example.com").unwrap());
        presence.set_status("Hi, it's Romeo");
        let elem = Element::from(presence);
        assert_eq!(elem.attr("type"), Some("subscribe"));
        assert_eq!(elem.attr("to"), Some("juliet@example.com"));
        let status = elem.get_child("status", ns::DEFAULT_NS).unwrap();
        assert_eq!(status.text(), "Hi, it's Romeo");
    }

    #[test]
    fn test_unknown_payload_kept() {
        let elem: Element = "<presence xmlns='jabber:client' type='subscribe'><nick xmlns='http://jabber.org/protocol/nick'>Romeo</nick></presence>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.payloads.len(), 1);
        assert!(presence.payloads[0].is("nick", "http://jabber.org/protocol/nick"));
    }

    #[test]
    fn test_wrong_element() {
        let elem: Element = "<message xmlns='jabber:client'/>".parse().unwrap();
        match Presence::try_from(elem) {
            Err(FromElementError::Mismatch(elem)) => assert_eq!(elem.name(), "message"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
