// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the SASL "PLAIN" mechanism.

use crate::client::{Mechanism, MechanismError};
use crate::common::{Credentials, Identity, Secret};

/// A struct for the SASL PLAIN mechanism.
pub struct Plain {
    authzid: Option<String>,
    username: String,
    password: String,
}

impl Plain {
    /// Constructs a new struct for authenticating using the SASL PLAIN mechanism.
    ///
    /// It is recommended that instead you use a `Credentials` struct and turn it into the
    /// requested mechanism using `from_credentials`.
    pub fn new<N: Into<String>, P: Into<String>>(username: N, password: P) -> Plain {
        Plain {
            authzid: None,
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Mechanism for Plain {
    fn name(&self) -> &str {
        "PLAIN"
    }

    fn from_credentials(credentials: Credentials) -> Result<Plain, MechanismError> {
        match (credentials.identity, credentials.secret) {
            (Identity::Username(username), Secret::Password(password)) => Ok(Plain {
                authzid: credentials.authzid,
                username,
                password,
            }),
            _ => Err(MechanismError::PlainRequiresUsernamePassword),
        }
    }

    fn initial(&mut self) -> Vec<u8> {
        let mut auth = Vec::new();
        if let Some(authzid) = &self.authzid {
            auth.extend(authzid.bytes());
        }
        auth.push(0);
        auth.extend(self.username.bytes());
        auth.push(0);
        auth.extend(self.password.bytes());
        auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_response() {
        let mut mechanism = Plain::new("user", "pencil");
        assert_eq!(mechanism.initial(), b"\0user\0pencil");
    }

    #[test]
    fn initial_response_with_authzid() {
        let credentials = Credentials::default()
            .with_username("user")
            .with_password("pencil")
            .with_authzid("admin@example.org");
        let mut mechanism = Plain::from_credentials(credentials).unwrap();
        assert_eq!(mechanism.initial(), b"admin@example.org\0user\0pencil");
    }

    #[test]
    fn requires_password() {
        let credentials = Credentials::default().with_username("user");
        assert_eq!(
            Plain::from_credentials(credentials).err(),
            Some(MechanismError::PlainRequiresUsernamePassword)
        );
    }
}
