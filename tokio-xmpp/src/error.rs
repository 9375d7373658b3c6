use sasl::client::MechanismError as SaslMechanismError;
use std::error::Error as StdError;
use std::fmt;

use crate::{
    client::iq::IqFailure,
    jid,
    parsers::sasl::{DefinedCondition as SaslDefinedCondition, Failure as SaslFailure},
    parsers::stanza_error::StanzaError,
};

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Error parsing Jabber-Id
    JidParse(jid::Error),
    /// Protocol-level error
    Protocol(ProtocolError),
    /// Authentication error
    Auth(AuthError),
    /// The peer answered a request with a stanza error
    Stanza(StanzaError),
    /// No response arrived for a request before its timeout
    NoResponse,
    /// The IQ tracking machinery failed
    Iq(IqFailure),
    /// Connection closed
    Disconnected,
    /// The operation is not allowed in the current connection state
    InvalidState,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::JidParse(e) => write!(fmt, "jid parse error: {}", e),
            Error::Protocol(e) => write!(fmt, "protocol error: {}", e),
            Error::Auth(e) => write!(fmt, "authentication error: {}", e),
            Error::Stanza(e) => write!(fmt, "stanza error: {}", e.defined_condition),
            Error::NoResponse => write!(fmt, "no response received"),
            Error::Iq(e) => write!(fmt, "IQ error: {}", e),
            Error::Disconnected => write!(fmt, "disconnected"),
            Error::InvalidState => write!(fmt, "invalid state"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::JidParse(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Auth(e) => Some(e),
            Error::Iq(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jid::Error> for Error {
    fn from(e: jid::Error) -> Self {
        Error::JidParse(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<StanzaError> for Error {
    fn from(e: StanzaError) -> Self {
        Error::Stanza(e)
    }
}

impl From<IqFailure> for Error {
    fn from(e: IqFailure) -> Self {
        Error::Iq(e)
    }
}

/// XMPP protocol-level error
#[derive(Debug)]
pub enum ProtocolError {
    /// Error with expected stanza schema
    Parsers(xso::error::Error),
    /// A response carried a payload of an unexpected kind
    UnexpectedPayload,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolError::Parsers(e) => write!(fmt, "error with expected stanza schema: {}", e),
            ProtocolError::UnexpectedPayload => write!(fmt, "unexpected payload in response"),
        }
    }
}

impl StdError for ProtocolError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProtocolError::Parsers(e) => Some(e),
            ProtocolError::UnexpectedPayload => None,
        }
    }
}

impl From<xso::error::Error> for ProtocolError {
    fn from(e: xso::error::Error) -> Self {
        ProtocolError::Parsers(e)
    }
}

impl From<xso::error::FromElementError> for ProtocolError {
    fn from(e: xso::error::FromElementError) -> Self {
        ProtocolError::Parsers(e.into())
    }
}

impl From<xso::error::Error> for Error {
    fn from(e: xso::error::Error) -> Self {
        ProtocolError::Parsers(e).into()
    }
}

impl From<xso::error::FromElementError> for Error {
    fn from(e: xso::error::FromElementError) -> Self {
        ProtocolError::from(e).into()
    }
}

/// Authentication error
///
/// The three conditions a user can act upon get their own variant; any other
/// server condition ends up in [`AuthError::Failed`], which still carries the
/// original `<failure/>`.
#[derive(Debug)]
pub enum AuthError {
    /// No matching SASL mechanism available
    NoMechanism,
    /// The server rejected the credentials
    NotAuthorized(SaslFailure),
    /// The account has been disabled
    AccountDisabled(SaslFailure),
    /// The credentials have expired
    CredentialsExpired(SaslFailure),
    /// Any other authentication failure
    Failed(FailureCause),
}

/// What caused a generic [`AuthError::Failed`].
#[derive(Debug)]
pub enum FailureCause {
    /// A `<failure/>` from the server with a condition without its own
    /// [`AuthError`] variant.
    Server(SaslFailure),
    /// Local SASL implementation error
    Mechanism(SaslMechanismError),
    /// Neither success nor failure arrived in time.
    Timeout,
}

impl AuthError {
    /// The SASL condition sent by the server, if this error came from a
    /// `<failure/>`.
    pub fn condition(&self) -> Option<SaslDefinedCondition> {
        match self {
            AuthError::NotAuthorized(failure)
            | AuthError::AccountDisabled(failure)
            | AuthError::CredentialsExpired(failure)
            | AuthError::Failed(FailureCause::Server(failure)) => {
                Some(failure.defined_condition)
            }
            _ => None,
        }
    }
}

impl From<SaslFailure> for AuthError {
    fn from(failure: SaslFailure) -> Self {
        match failure.defined_condition {
            SaslDefinedCondition::NotAuthorized => AuthError::NotAuthorized(failure),
            SaslDefinedCondition::AccountDisabled => AuthError::AccountDisabled(failure),
            SaslDefinedCondition::CredentialsExpired => AuthError::CredentialsExpired(failure),
            _ => AuthError::Failed(FailureCause::Server(failure)),
        }
    }
}

impl From<SaslMechanismError> for AuthError {
    fn from(e: SaslMechanismError) -> Self {
        AuthError::Failed(FailureCause::Mechanism(e))
    }
}

impl StdError for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::NoMechanism => write!(fmt, "no matching SASL mechanism available"),
            AuthError::NotAuthorized(_) => write!(fmt, "not authorized"),
            AuthError::AccountDisabled(_) => write!(fmt, "account disabled"),
            AuthError::CredentialsExpired(_) => write!(fmt, "credentials expired"),
            AuthError::Failed(cause) => write!(fmt, "authentication failed: {}", cause),
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureCause::Server(failure) => {
                write!(fmt, "failure from the server: {}", failure.defined_condition)
            }
            FailureCause::Mechanism(e) => write!(fmt, "local SASL implementation error: {}", e),
            FailureCause::Timeout => write!(fmt, "timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_mapping() {
        let cases = [
            (SaslDefinedCondition::NotAuthorized, "not authorized"),
            (SaslDefinedCondition::AccountDisabled, "account disabled"),
            (SaslDefinedCondition::CredentialsExpired, "credentials expired"),
            (
                SaslDefinedCondition::MechanismTooWeak,
                "authentication failed: failure from the server: mechanism-too-weak",
            ),
            (
                SaslDefinedCondition::TemporaryAuthFailure,
                "authentication failed: failure from the server: temporary-auth-failure",
            ),
        ];
        for (condition, message) in cases {
            let error = AuthError::from(SaslFailure::new(condition));
            assert_eq!(error.to_string(), message);
            assert_eq!(error.condition(), Some(condition));
        }
    }

    #[test]
    fn timeout_has_no_condition() {
        let error = AuthError::Failed(FailureCause::Timeout);
        assert_eq!(error.condition(), None);
        assert!(matches!(
            Error::from(error),
            Error::Auth(AuthError::Failed(FailureCause::Timeout))
        ));
    }
}
