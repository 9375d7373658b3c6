// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

use crate::common::Credentials;

#[cfg(feature = "scram")]
use crate::common::scram::DeriveError;

pub mod mechanisms;

/// Errors a client mechanism can fail with during an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechanismError {
    /// PLAIN needs both a username and a password.
    PlainRequiresUsernamePassword,

    /// The random number generator could not produce a nonce.
    CannotGenerateNonce,
    /// SCRAM needs both a username and a password.
    ScramRequiresUsernamePassword,
    /// The challenge was not valid UTF-8 or carried invalid base64.
    CannotDecodeChallenge,
    /// The server-first message lacked a nonce.
    NoServerNonce,
    /// The server-first message lacked a salt.
    NoServerSalt,
    /// The server-first message lacked an iteration count.
    NoServerIterations,
    /// The iteration count was not a positive decimal integer.
    InvalidIterationCount,
    /// The server nonce did not start with the client nonce.
    NonceMismatch,
    /// Key derivation failed.
    #[cfg(feature = "scram")]
    DeriveError(DeriveError),
    /// The additional data of the success could not be decoded.
    CannotDecodeSuccessResponse,
    /// The additional data of the success carried no server signature.
    NoSignatureInSuccessResponse,
    /// The server signature did not match the expected one.
    InvalidSignatureInSuccessResponse,
    /// The server reported an error in its final message.
    ServerError(String),

    /// A message arrived that this mechanism was not expecting.
    InvalidState,
}

#[cfg(feature = "scram")]
impl From<DeriveError> for MechanismError {
    fn from(err: DeriveError) -> MechanismError {
        MechanismError::DeriveError(err)
    }
}

impl fmt::Display for MechanismError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MechanismError::PlainRequiresUsernamePassword => {
                write!(fmt, "PLAIN requires a username and a password")
            }
            MechanismError::CannotGenerateNonce => write!(fmt, "can't generate nonce"),
            MechanismError::ScramRequiresUsernamePassword => {
                write!(fmt, "SCRAM requires a username and a password")
            }
            MechanismError::CannotDecodeChallenge => write!(fmt, "can't decode challenge"),
            MechanismError::NoServerNonce => write!(fmt, "no server nonce"),
            MechanismError::NoServerSalt => write!(fmt, "no server salt"),
            MechanismError::NoServerIterations => write!(fmt, "no server iterations"),
            MechanismError::InvalidIterationCount => write!(fmt, "invalid iteration count"),
            MechanismError::NonceMismatch => {
                write!(fmt, "server nonce doesn't extend the client nonce")
            }
            #[cfg(feature = "scram")]
            MechanismError::DeriveError(err) => write!(fmt, "derive error: {}", err),
            MechanismError::CannotDecodeSuccessResponse => {
                write!(fmt, "can't decode success response")
            }
            MechanismError::NoSignatureInSuccessResponse => {
                write!(fmt, "no signature in success response")
            }
            MechanismError::InvalidSignatureInSuccessResponse => {
                write!(fmt, "invalid signature in success response")
            }
            MechanismError::ServerError(err) => write!(fmt, "server error: {}", err),
            MechanismError::InvalidState => write!(fmt, "not in the right state to receive this response"),
        }
    }
}

impl std::error::Error for MechanismError {}

/// A trait which defines SASL mechanisms.
pub trait Mechanism {
    /// The name of the mechanism.
    fn name(&self) -> &str;

    /// Creates this mechanism from `Credentials`.
    fn from_credentials(credentials: Credentials) -> Result<Self, MechanismError>
    where
        Self: Sized;

    /// Provides initial payload of the SASL mechanism.
    fn initial(&mut self) -> Vec<u8> {
        Vec::new()
    }

    /// Creates a response to the SASL challenge.
    fn response(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, MechanismError> {
        Ok(Vec::new())
    }

    /// Verifies the server success response, if there is one.
    fn success(&mut self, _data: &[u8]) -> Result<(), MechanismError> {
        Ok(())
    }
}
