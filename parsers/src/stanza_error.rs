// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use std::fmt;

use jid::Jid;
use minidom::Element;
use xso::error::{Error, FromElementError};
use xso::{AsXml, FromXml};

use crate::ns;

generate_attribute!(
    /// The type of the error.
    ErrorType, "type", {
        /// Retry after providing credentials.
        Auth => "auth",

        /// Do not retry (the error cannot be remedied).
        Cancel => "cancel",

        /// Proceed (the condition was only a warning).
        Continue => "continue",

        /// Retry after changing the data sent.
        Modify => "modify",

        /// Retry after waiting (the error is temporary).
        Wait => "wait",
    }
);

/// List of valid error conditions, see RFC 6120 section 8.3.3.
#[derive(FromXml, AsXml, PartialEq, Eq, Hash, Debug, Clone, Copy)]
#[xml(namespace = ns::XMPP_STANZAS, exhaustive)]
pub enum DefinedCondition {
    /// The sender has sent a stanza containing XML that does not conform
    /// to the appropriate schema or that cannot be processed.
    #[xml(name = "bad-request")]
    BadRequest,

    /// Access cannot be granted because an existing resource exists with
    /// the same name or address.
    #[xml(name = "conflict")]
    Conflict,

    /// The feature represented in the XML stanza is not implemented by
    /// the intended recipient.
    #[xml(name = "feature-not-implemented")]
    FeatureNotImplemented,

    /// The requesting entity does not possess the necessary permissions.
    #[xml(name = "forbidden")]
    Forbidden,

    /// The recipient or server can no longer be contacted at this
    /// address.
    #[xml(name = "gone")]
    Gone,

    /// The server has experienced a misconfiguration or other internal
    /// error.
    #[xml(name = "internal-server-error")]
    InternalServerError,

    /// The addressed JID or item requested cannot be found.
    #[xml(name = "item-not-found")]
    ItemNotFound,

    /// The sending entity has provided a malformed address.
    #[xml(name = "jid-malformed")]
    JidMalformed,

    /// The request does not meet criteria defined by the recipient.
    #[xml(name = "not-acceptable")]
    NotAcceptable,

    /// The recipient or server does not allow any entity to perform the
    /// action.
    #[xml(name = "not-allowed")]
    NotAllowed,

    /// The sender needs to provide credentials before being allowed to
    /// perform the action.
    #[xml(name = "not-authorized")]
    NotAuthorized,

    /// The entity has violated some local service policy.
    #[xml(name = "policy-violation")]
    PolicyViolation,

    /// The intended recipient is temporarily unavailable.
    #[xml(name = "recipient-unavailable")]
    RecipientUnavailable,

    /// The recipient or server is redirecting requests for this
    /// information to another entity.
    #[xml(name = "redirect")]
    Redirect,

    /// Prior registration is necessary.
    #[xml(name = "registration-required")]
    RegistrationRequired,

    /// A remote server or service does not exist or cannot be resolved.
    #[xml(name = "remote-server-not-found")]
    RemoteServerNotFound,

    /// A remote server or service could not be contacted in time.
    #[xml(name = "remote-server-timeout")]
    RemoteServerTimeout,

    /// The server or recipient is busy or lacks the system resources
    /// necessary to service the request.
    #[xml(name = "resource-constraint")]
    ResourceConstraint,

    /// The server or recipient does not currently provide the requested
    /// service.
    #[xml(name = "service-unavailable")]
    ServiceUnavailable,

    /// A prior subscription is necessary.
    #[xml(name = "subscription-required")]
    SubscriptionRequired,

    /// The error condition is not one of those defined by the other
    /// conditions in this list.
    #[xml(name = "undefined-condition")]
    UndefinedCondition,

    /// The recipient or server understood the request but was not
    /// expecting it at this time.
    #[xml(name = "unexpected-request")]
    UnexpectedRequest,
}

impl fmt::Display for DefinedCondition {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(Element::from(*self).name())
    }
}

type Lang = String;

/// The representation of a stanza error.
#[derive(Debug, Clone, PartialEq)]
pub struct StanzaError {
    /// The type of this error.
    pub type_: ErrorType,

    /// The JID of the entity who set this error.
    pub by: Option<Jid>,

    /// One of the defined conditions for this error to happen.
    pub defined_condition: DefinedCondition,

    /// Human-readable description of this error.
    pub texts: BTreeMap<Lang, String>,

    /// A protocol-specific extension for this error.
    pub other: Option<Element>,
}

impl StanzaError {
    /// Create a new `<error/>` with the according content.
    pub fn new<L, T>(
        type_: ErrorType,
        defined_condition: DefinedCondition,
        lang: L,
        text: T,
    ) -> StanzaError
    where
        L: Into<Lang>,
        T: Into<String>,
    {
        StanzaError {
            type_,
            by: None,
            defined_condition,
            texts: {
                let mut map = BTreeMap::new();
                map.insert(lang.into(), text.into());
                map
            },
            other: None,
        }
    }

    /// Create a new `<error/>` with only a type and a condition.
    pub fn from_condition(type_: ErrorType, defined_condition: DefinedCondition) -> StanzaError {
        StanzaError {
            type_,
            by: None,
            defined_condition,
            texts: BTreeMap::new(),
            other: None,
        }
    }
}

impl TryFrom<Element> for StanzaError {
    type Error = FromElementError;

    fn try_from(elem: Element) -> Result<StanzaError, FromElementError> {
        check_self!(elem, "error", DEFAULT_NS);
        // The code attribute has been deprecated in XEP-0086, it is accepted
        // but dropped.
        check_no_unknown_attributes!(elem, "error", ["type", "by", "code"]);

        let mut stanza_error = StanzaError {
            type_: get_attr!(elem, "type", Required),
            by: get_attr!(elem, "by", Option),
            defined_condition: DefinedCondition::UndefinedCondition,
            texts: BTreeMap::new(),
            other: None,
        };
        let mut defined_condition = None;

        for child in elem.children() {
            if child.is("text", ns::XMPP_STANZAS) {
                check_no_children!(child, "text");
                check_no_unknown_attributes!(child, "text", ["xml:lang"]);
                let lang: Lang = get_attr!(child, "xml:lang", Default);
                if stanza_error.texts.insert(lang, child.text()).is_some() {
                    return Err(
                        Error::Other("Text element present twice for the same xml:lang.").into(),
                    );
                }
            } else if child.has_ns(ns::XMPP_STANZAS) {
                if defined_condition.is_some() {
                    return Err(Error::Other(
                        "Error must not have more than one defined-condition.",
                    )
                    .into());
                }
                check_no_attributes!(child, "defined-condition");
                check_no_children!(child, "defined-condition");
                defined_condition = Some(DefinedCondition::try_from(child.clone())?);
            } else {
                if stanza_error.other.is_some() {
                    return Err(
                        Error::Other("Error must not have more than one other element.").into(),
                    );
                }
                stanza_error.other = Some(child.clone());
            }
        }
        stanza_error.defined_condition =
            defined_condition.ok_or(Error::Other("Error must have a defined-condition."))?;

        Ok(stanza_error)
    }
}

impl From<StanzaError> for Element {
    fn from(err: StanzaError) -> Element {
        Element::builder("error", ns::DEFAULT_NS)
            .attr("type", err.type_)
            .attr("by", err.by.map(|by| by.to_string()))
            .append(Element::from(err.defined_condition))
            .append_all(err.texts.into_iter().map(|(lang, text)| {
                Element::builder("text", ns::XMPP_STANZAS)
                    .attr("xml:lang", lang)
                    .append(text)
            }))
            .append_all(err.other)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        let elem: Element = "<error xmlns='jabber:client' type='cancel'><undefined-condition xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error>".parse().unwrap();
        let error = StanzaError::try_from(elem).unwrap();
        assert_eq!(error.type_, ErrorType::Cancel);
        assert_eq!(
            error.defined_condition,
            DefinedCondition::UndefinedCondition
        );
    }

    #[test]
    fn test_invalid_type() {
        let elem: Element = "<error xmlns='jabber:client'/>".parse().unwrap();
        let error = StanzaError::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Required attribute 'type' missing.");

        let elem: Element = "<error xmlns='jabber:client' type='coucou'/>"
            .parse()
            .unwrap();
        let error = StanzaError::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::TextParseError(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message.to_string(), "Unknown value for 'type' attribute.");
    }

    #[test]
    fn test_invalid_condition() {
        let elem: Element = "<error xmlns='jabber:client' type='cancel'/>"
            .parse()
            .unwrap();
        let error = StanzaError::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Error must have a defined-condition.");
    }

    #[test]
    fn test_serialise_service_unavailable() {
        let error = StanzaError::from_condition(ErrorType::Cancel, DefinedCondition::ServiceUnavailable);
        let elem = Element::from(error.clone());
        assert_eq!(elem.attr("type"), Some("cancel"));
        assert!(elem
            .get_child("service-unavailable", ns::XMPP_STANZAS)
            .is_some());
        assert_eq!(StanzaError::try_from(elem).unwrap(), error);
    }

    #[test]
    fn test_condition_display() {
        assert_eq!(DefinedCondition::ItemNotFound.to_string(), "item-not-found");
        assert_eq!(
            DefinedCondition::FeatureNotImplemented.to_string(),
            "feature-not-implemented"
        );
    }

    #[test]
    fn test_texts() {
        let elem: Element = "<error xmlns='jabber:client' type='modify'><bad-request xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/><text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas' xml:lang='en'>Nope</text></error>".parse().unwrap();
        let error = StanzaError::try_from(elem).unwrap();
        assert_eq!(error.defined_condition, DefinedCondition::BadRequest);
        assert_eq!(error.texts["en"], "Nope");
    }
}
