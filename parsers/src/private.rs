// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XEP-0049 private XML storage, and the XEP-0083 nested roster group
//! delimiter kept in it.

use minidom::Element;
use xso::{text::EmptyAsNone, AsXml, FromXml};

use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

/// A `<query xmlns='jabber:iq:private'/>` wrapping one stored element.
#[derive(FromXml, AsXml, Debug, Clone, PartialEq)]
#[xml(namespace = ns::PRIVATE, name = "query")]
pub struct Query {
    /// The stored element, or the empty element naming what to retrieve.
    #[xml(element(default))]
    pub payload: Option<Element>,
}

impl IqGetPayload for Query {}
impl IqSetPayload for Query {}
impl IqResultPayload for Query {}

/// The nested roster group delimiter, `None` when nothing is stored.
#[derive(FromXml, AsXml, Debug, Clone, PartialEq, Default)]
#[xml(namespace = ns::ROSTER_DELIMITER, name = "roster")]
pub struct RosterDelimiter {
    /// The delimiter string.
    #[xml(text = EmptyAsNone)]
    pub delimiter: Option<String>,
}

impl RosterDelimiter {
    /// Wraps this delimiter in a private storage query.
    pub fn into_query(self) -> Query {
        Query {
            payload: Some(self.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter() {
        let elem: Element = "<query xmlns='jabber:iq:private'><roster xmlns='roster:delimiter'>::</roster></query>"
            .parse()
            .unwrap();
        let query = Query::try_from(elem).unwrap();
        let delimiter = RosterDelimiter::try_from(query.payload.unwrap()).unwrap();
        assert_eq!(delimiter.delimiter.as_deref(), Some("::"));
    }

    #[test]
    fn test_request() {
        let query = RosterDelimiter::default().into_query();
        let elem = Element::from(query);
        assert!(elem.is("query", ns::PRIVATE));
        let roster = elem.get_child("roster", ns::ROSTER_DELIMITER).unwrap();
        assert_eq!(roster.text(), "");
        assert_eq!(roster.children().count(), 0);
    }

    #[test]
    fn test_empty_query() {
        let elem: Element = "<query xmlns='jabber:iq:private'/>".parse().unwrap();
        let query = Query::try_from(elem).unwrap();
        assert!(query.payload.is_none());
    }

    #[test]
    fn test_empty_delimiter() {
        let elem: Element = "<roster xmlns='roster:delimiter'/>".parse().unwrap();
        let delimiter = RosterDelimiter::try_from(elem).unwrap();
        assert!(delimiter.delimiter.is_none());
    }
}
