// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::string::FromUtf8Error;

/// Hash providers and helpers for the SCRAM family.
#[cfg(feature = "scram")]
pub mod scram;

/// An identity, as used by mechanisms which need one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Identity {
    /// No identity.
    #[default]
    None,

    /// A username.
    Username(String),
}

impl From<String> for Identity {
    fn from(s: String) -> Identity {
        Identity::Username(s)
    }
}

impl<'a> From<&'a str> for Identity {
    fn from(s: &'a str) -> Identity {
        Identity::Username(s.to_owned())
    }
}

/// A secret used to prove an identity.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub enum Secret {
    /// No secret.
    #[default]
    None,

    /// A password in plain text.
    Password(String),
}

impl Secret {
    /// Creates a plain text password secret.
    pub fn password_plain<S: Into<String>>(password: S) -> Secret {
        Secret::Password(password.into())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Secret::None => fmt.write_str("None"),
            Secret::Password(_) => fmt.write_str("Password(..)"),
        }
    }
}

/// A struct containing SASL credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    /// The requested identity.
    pub identity: Identity,
    /// The secret used to prove that identity.
    pub secret: Secret,
    /// The identity to act as, when different from the authenticated one.
    pub authzid: Option<String>,
}

impl Credentials {
    /// Creates a new Credentials with the specified username.
    pub fn with_username<N: Into<String>>(mut self, username: N) -> Credentials {
        self.identity = Identity::Username(username.into());
        self
    }

    /// Creates a new Credentials with the specified plaintext password.
    pub fn with_password<P: Into<String>>(mut self, password: P) -> Credentials {
        self.secret = Secret::password_plain(password);
        self
    }

    /// Creates a new Credentials with the specified authorization identity.
    pub fn with_authzid<A: Into<String>>(mut self, authzid: A) -> Credentials {
        self.authzid = Some(authzid.into());
        self
    }
}

/// Parses a comma-separated list of `key=value` attributes.
///
/// Pairs without a `=` are skipped; only the first `=` separates the key.
pub fn parse_frame(frame: &[u8]) -> Result<HashMap<String, String>, FromUtf8Error> {
    let inner = String::from_utf8(frame.to_owned())?;
    let mut ret = HashMap::new();
    for s in inner.split(',') {
        let mut tmp = s.splitn(2, '=');
        let key = tmp.next();
        let val = tmp.next();
        if let (Some(k), Some(v)) = (key, val) {
            ret.insert(k.to_owned(), v.to_owned());
        }
    }
    Ok(ret)
}

/// Xors two byte slices of the same length together.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(a, b)| a ^ b).collect()
}
