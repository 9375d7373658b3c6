// Copyright (c) 2024 xmpp-rs contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use minidom::Element;
use xso::{AsXml, FromXml};

use crate::ns;

/// Wraps `<stream:features/>`, usually the very first nonza of a
/// XMPP stream. Indicates which features are supported.
#[derive(FromXml, AsXml, PartialEq, Debug, Default, Clone)]
#[xml(namespace = ns::STREAM, name = "features")]
pub struct StreamFeatures {
    /// List of supported SASL mechanisms
    #[xml(child(default))]
    pub sasl_mechanisms: SaslMechanisms,

    /// Roster versioning is supported.
    #[xml(child(default))]
    pub roster_ver: Option<RosterVer>,

    /// Other stream features advertised
    #[xml(element(n = ..))]
    pub others: Vec<Element>,
}

/// Marker advertising roster versioning, RFC 6121 section 2.6.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::ROSTER_VER, name = "ver")]
pub struct RosterVer;

/// List of supported SASL mechanisms
#[derive(FromXml, AsXml, PartialEq, Debug, Clone, Default)]
#[xml(namespace = ns::SASL, name = "mechanisms")]
pub struct SaslMechanisms {
    /// Names of the mechanisms, in the order the server listed them.
    #[xml(extract(n = .., name = "mechanism", fields(text(type_ = String))))]
    pub mechanisms: Vec<String>,
}

impl StreamFeatures {
    /// Does the server support roster versioning?
    pub fn can_roster_version(&self) -> bool {
        self.roster_ver.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sasl_mechanisms() {
        let elem: Element = "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>
            <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>
                <mechanism>PLAIN</mechanism>
                <mechanism>SCRAM-SHA-1</mechanism>
                <mechanism>SCRAM-SHA-1-PLUS</mechanism>
            </mechanisms>
        </stream:features>"
            .parse()
            .unwrap();

        let features = StreamFeatures::try_from(elem).unwrap();
        assert_eq!(
            features.sasl_mechanisms.mechanisms,
            ["PLAIN", "SCRAM-SHA-1", "SCRAM-SHA-1-PLUS"]
        );
        assert!(!features.can_roster_version());
    }

    #[test]
    fn test_roster_versioning() {
        let elem: Element = "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>
                                 <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>
                                 <ver xmlns='urn:xmpp:features:rosterver'/>
                             </stream:features>"
            .parse()
            .unwrap();

        let features = StreamFeatures::try_from(elem).unwrap();
        assert!(features.can_roster_version());
        assert_eq!(features.sasl_mechanisms.mechanisms.len(), 0);
        assert_eq!(features.others.len(), 1);
        assert!(features.others[0].is("bind", "urn:ietf:params:xml:ns:xmpp-bind"));
    }

    #[test]
    fn test_empty_features() {
        let elem: Element = "<stream:features xmlns:stream='http://etherx.jabber.org/streams'/>"
            .parse()
            .unwrap();

        let features = StreamFeatures::try_from(elem).unwrap();
        assert!(!features.can_roster_version());
        assert_eq!(features.sasl_mechanisms.mechanisms.len(), 0);
        assert!(features.others.is_empty());
    }

    #[test]
    fn test_serialise_roster_ver() {
        let features = StreamFeatures {
            roster_ver: Some(RosterVer),
            ..Default::default()
        };
        let elem = Element::from(features);
        assert!(elem.has_child("ver", ns::ROSTER_VER));
    }

    #[test]
    fn test_unknown_mechanisms_child() {
        let elem: Element = "<mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><foo/></mechanisms>"
            .parse()
            .unwrap();
        match SaslMechanisms::try_from(elem) {
            Err(xso::error::FromElementError::Invalid(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
