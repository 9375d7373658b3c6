// Copyright (c) 2018 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::fmt;

use minidom::Element;
use xso::{text::Base64, AsXml, FromXml};

use crate::ns;

generate_attribute!(
    /// The list of SASL mechanisms known to this crate.
    Mechanism, "mechanism", {
        /// Uses no hashing mechanism and transmit the password in clear to the
        /// server, using a single step.
        Plain => "PLAIN",

        /// Challenge-based mechanism using HMAC and SHA-1, allows both the
        /// client and the server to avoid having to store the password in
        /// clear.
        ///
        /// See <https://www.rfc-editor.org/rfc/rfc5802>
        ScramSha1 => "SCRAM-SHA-1",

        /// Same as [ScramSha1](#structfield.ScramSha1), but using SHA-256
        /// instead of SHA-1 as the hash function.
        ScramSha256 => "SCRAM-SHA-256",

        /// Legacy digest challenge mechanism.
        ///
        /// See <https://www.rfc-editor.org/rfc/rfc2831>
        DigestMd5 => "DIGEST-MD5",

        /// Kerberos V5 via the Generic Security Service API.
        Gssapi => "GSSAPI",

        /// Legacy keyed-MD5 challenge mechanism.
        CramMd5 => "CRAM-MD5",

        /// Creates a temporary JID on login, which will be destroyed on
        /// disconnect.
        Anonymous => "ANONYMOUS",
    }
);

/// The first step of the SASL process, selecting the mechanism and sending
/// the first part of the handshake.
///
/// An empty initial response is serialised as an empty element, it is never
/// left out.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::SASL, name = "auth")]
pub struct Auth {
    /// The mechanism used.
    #[xml(attribute)]
    pub mechanism: Mechanism,

    /// The content of the handshake.
    #[xml(text = Base64)]
    pub data: Vec<u8>,
}

/// In case the mechanism selected at the [auth](struct.Auth.html) step
/// requires a second step, the server sends this element with additional
/// data.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::SASL, name = "challenge")]
pub struct Challenge {
    /// The challenge data.
    #[xml(text = Base64)]
    pub data: Vec<u8>,
}

/// The client’s response to the server’s [challenge](struct.Challenge.html).
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::SASL, name = "response")]
pub struct Response {
    /// The response data.
    #[xml(text = Base64)]
    pub data: Vec<u8>,
}

/// Sent by the server on SASL success, possibly with additional data for
/// the client to verify.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::SASL, name = "success")]
pub struct Success {
    /// Possible data sent on success.
    #[xml(text = Base64)]
    pub data: Vec<u8>,
}

/// List of possible failure conditions for SASL.
#[derive(FromXml, AsXml, PartialEq, Eq, Hash, Debug, Clone, Copy)]
#[xml(namespace = ns::SASL)]
pub enum DefinedCondition {
    /// The client aborted the authentication.
    #[xml(name = "aborted")]
    Aborted,

    /// The account the client is trying to authenticate against has been
    /// disabled.
    #[xml(name = "account-disabled")]
    AccountDisabled,

    /// The credentials for this account have expired.
    #[xml(name = "credentials-expired")]
    CredentialsExpired,

    /// You must enable StartTLS or use direct TLS before using this
    /// authentication mechanism.
    #[xml(name = "encryption-required")]
    EncryptionRequired,

    /// The base64 data sent by the client is invalid.
    #[xml(name = "incorrect-encoding")]
    IncorrectEncoding,

    /// The authzid provided by the client is invalid.
    #[xml(name = "invalid-authzid")]
    InvalidAuthzid,

    /// The client tried to use an invalid mechanism, or none.
    #[xml(name = "invalid-mechanism")]
    InvalidMechanism,

    /// The client sent a bad request.
    #[xml(name = "malformed-request")]
    MalformedRequest,

    /// The mechanism selected is weaker than what the server allows.
    #[xml(name = "mechanism-too-weak")]
    MechanismTooWeak,

    /// The credentials provided are invalid.
    #[xml(name = "not-authorized")]
    NotAuthorized,

    /// The server encountered an issue which may be fixed later, the
    /// client should retry at some point.
    #[xml(name = "temporary-auth-failure")]
    TemporaryAuthFailure,
}

impl fmt::Display for DefinedCondition {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(Element::from(*self).name())
    }
}

type Lang = String;

/// Sent by the server on SASL failure.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::SASL, name = "failure")]
pub struct Failure {
    /// One of the allowed defined-conditions for SASL.
    #[xml(child)]
    pub defined_condition: DefinedCondition,

    /// A human-readable explanation for the failure.
    #[xml(extract(n = .., name = "text", fields(
        attribute(type_ = String, name = "xml:lang", default),
        text(type_ = String),
    )))]
    pub texts: BTreeMap<Lang, String>,
}

impl Failure {
    /// Creates a failure carrying only a condition.
    pub fn new(defined_condition: DefinedCondition) -> Failure {
        Failure {
            defined_condition,
            texts: BTreeMap::new(),
        }
    }
}

/// Enum which allows parsing any SASL element the server may send during
/// authentication.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml()]
pub enum Nonza {
    /// Failure of SASL transaction
    #[xml(transparent)]
    Failure(Failure),

    /// Success of SASL transaction
    #[xml(transparent)]
    Success(Success),

    /// Challenge sent by the server to the client
    #[xml(transparent)]
    Challenge(Challenge),
}

#[cfg(test)]
mod tests {
    use super::*;
    use xso::error::{Error, FromElementError};

    #[test]
    fn test_simple() {
        let elem: Element = "<auth xmlns='urn:ietf:params:xml:ns:xmpp-sasl' mechanism='PLAIN'/>"
            .parse()
            .unwrap();
        let auth = Auth::try_from(elem).unwrap();
        assert_eq!(auth.mechanism, Mechanism::Plain);
        assert!(auth.data.is_empty());
    }

    #[test]
    fn test_empty_initial_response_is_kept() {
        let elem: Element = Auth {
            mechanism: Mechanism::Anonymous,
            data: Vec::new(),
        }
        .into();
        assert!(elem.is("auth", ns::SASL));
        assert_eq!(elem.attr("mechanism"), Some("ANONYMOUS"));
        assert_eq!(elem.text(), "");
    }

    #[test]
    fn test_auth_data() {
        let elem: Element = Auth {
            mechanism: Mechanism::ScramSha1,
            data: b"n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL".to_vec(),
        }
        .into();
        assert_eq!(elem.text(), "biwsbj11c2VyLHI9ZnlrbytkMmxiYkZnT05Sdjlxa3hkYXdM");
        let auth = Auth::try_from(elem).unwrap();
        assert_eq!(auth.data, b"n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL");
    }

    #[test]
    fn test_invalid_base64() {
        let elem: Element = "<challenge xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>!!!</challenge>"
            .parse()
            .unwrap();
        let error = Challenge::try_from(elem).unwrap_err();
        match error {
            FromElementError::Invalid(Error::TextParseError(_)) => (),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn section_6_5_1() {
        let elem: Element =
            "<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><aborted/></failure>"
                .parse()
                .unwrap();
        let failure = Failure::try_from(elem).unwrap();
        assert_eq!(failure.defined_condition, DefinedCondition::Aborted);
        assert!(failure.texts.is_empty());
    }

    #[test]
    fn section_6_5_2() {
        let elem: Element = "<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>
            <account-disabled/>
            <text xml:lang='en'>Call 212-555-1212 for assistance.</text>
        </failure>"
            .parse()
            .unwrap();
        let failure = Failure::try_from(elem).unwrap();
        assert_eq!(failure.defined_condition, DefinedCondition::AccountDisabled);
        assert_eq!(
            failure.texts["en"],
            String::from("Call 212-555-1212 for assistance.")
        );
    }

    #[test]
    fn test_nonza_dispatch() {
        let elem: Element = "<challenge xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>cj1meWtvK2QybGJiRmdPTlJ2OXFreGRhd0wzcmZjTkhZSlkxWlZ2V1ZzN2oscz1RU1hDUitRNnNlazhiZjkyLGk9NDA5Ng==</challenge>"
            .parse()
            .unwrap();
        match Nonza::try_from(elem).unwrap() {
            Nonza::Challenge(challenge) => assert_eq!(
                challenge.data,
                b"r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096"
            ),
            other => panic!("unexpected nonza: {:?}", other),
        }

        let elem: Element = "<mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>"
            .parse()
            .unwrap();
        match Nonza::try_from(elem) {
            Err(FromElementError::Mismatch(elem)) => assert_eq!(elem.name(), "mechanisms"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
