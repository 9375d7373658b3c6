// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the SASL "SCRAM-*" mechanisms and a way to implement more.

use std::marker::PhantomData;

use base64::{engine::general_purpose::STANDARD as Base64, Engine};

use crate::client::{Mechanism, MechanismError};
use crate::common::scram::{generate_nonce, ScramProvider};
use crate::common::{parse_frame, xor, Credentials, Identity, Secret};

enum ScramState {
    Init,
    SentInitialMessage {
        initial_message: Vec<u8>,
    },
    GotServerData {
        server_signature: Vec<u8>,
    },
}

/// A struct for the SASL SCRAM-* mechanisms.
pub struct Scram<S: ScramProvider> {
    name: String,
    username: String,
    password: String,
    client_nonce: String,
    gs2_header: Vec<u8>,
    state: ScramState,
    _marker: PhantomData<S>,
}

/// Escapes a `saslname` so that it can't be confused with the attribute
/// separators of a SCRAM message.
fn escape_saslname(name: &str) -> String {
    name.replace('=', "=3D").replace(',', "=2C")
}

fn gs2_header(authzid: Option<&str>) -> Vec<u8> {
    match authzid {
        Some(authzid) => format!("n,a={},", escape_saslname(authzid)).into_bytes(),
        None => b"n,,".to_vec(),
    }
}

impl<S: ScramProvider> Scram<S> {
    /// Constructs a new struct for authenticating using the SASL SCRAM-*
    /// mechanisms.
    ///
    /// It is recommended that instead you use a `Credentials` struct and turn it into the
    /// requested mechanism using `from_credentials`.
    pub fn new<N: Into<String>, P: Into<String>>(
        username: N,
        password: P,
    ) -> Result<Scram<S>, MechanismError> {
        let client_nonce = generate_nonce().map_err(|_| MechanismError::CannotGenerateNonce)?;
        Ok(Scram::new_with_nonce(
            username.into(),
            password.into(),
            None,
            client_nonce,
        ))
    }

    fn new_with_nonce(
        username: String,
        password: String,
        authzid: Option<String>,
        client_nonce: String,
    ) -> Scram<S> {
        Scram {
            name: format!("SCRAM-{}", S::name()),
            username,
            password,
            client_nonce,
            gs2_header: gs2_header(authzid.as_deref()),
            state: ScramState::Init,
            _marker: PhantomData,
        }
    }
}

impl<S: ScramProvider> Mechanism for Scram<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn from_credentials(credentials: Credentials) -> Result<Scram<S>, MechanismError> {
        match (credentials.identity, credentials.secret) {
            (Identity::Username(username), Secret::Password(password)) => {
                let client_nonce =
                    generate_nonce().map_err(|_| MechanismError::CannotGenerateNonce)?;
                Ok(Scram::new_with_nonce(
                    username,
                    password,
                    credentials.authzid,
                    client_nonce,
                ))
            }
            _ => Err(MechanismError::ScramRequiresUsernamePassword),
        }
    }

    fn initial(&mut self) -> Vec<u8> {
        let mut bare = b"n=".to_vec();
        bare.extend(escape_saslname(&self.username).bytes());
        bare.extend(b",r=");
        bare.extend(self.client_nonce.bytes());
        let mut data = self.gs2_header.clone();
        data.extend(&bare);
        self.state = ScramState::SentInitialMessage {
            initial_message: bare,
        };
        data
    }

    fn response(&mut self, challenge: &[u8]) -> Result<Vec<u8>, MechanismError> {
        let next_state;
        let ret;
        match self.state {
            ScramState::SentInitialMessage {
                ref initial_message,
            } => {
                let frame =
                    parse_frame(challenge).map_err(|_| MechanismError::CannotDecodeChallenge)?;
                let server_nonce = frame.get("r").ok_or(MechanismError::NoServerNonce)?;
                let salt = frame.get("s").ok_or(MechanismError::NoServerSalt)?;
                let salt = Base64
                    .decode(salt)
                    .map_err(|_| MechanismError::CannotDecodeChallenge)?;
                let iterations: u32 = frame
                    .get("i")
                    .ok_or(MechanismError::NoServerIterations)?
                    .parse()
                    .map_err(|_| MechanismError::InvalidIterationCount)?;
                if iterations == 0 {
                    return Err(MechanismError::InvalidIterationCount);
                }
                if !server_nonce.starts_with(&self.client_nonce) {
                    return Err(MechanismError::NonceMismatch);
                }

                let salted_password = S::derive(&self.password, &salt, iterations)?;

                let mut client_final_message_bare = b"c=".to_vec();
                client_final_message_bare.extend(Base64.encode(&self.gs2_header).bytes());
                client_final_message_bare.extend(b",r=");
                client_final_message_bare.extend(server_nonce.bytes());

                let client_key = S::hmac(b"Client Key", &salted_password)?;
                let server_key = S::hmac(b"Server Key", &salted_password)?;
                let mut auth_message = Vec::new();
                auth_message.extend(initial_message);
                auth_message.push(b',');
                auth_message.extend(challenge);
                auth_message.push(b',');
                auth_message.extend(&client_final_message_bare);
                let stored_key = S::hash(&client_key);
                let client_signature = S::hmac(&auth_message, &stored_key)?;
                let client_proof = xor(&client_key, &client_signature);
                let server_signature = S::hmac(&auth_message, &server_key)?;

                let mut client_final_message = Vec::new();
                client_final_message.extend(&client_final_message_bare);
                client_final_message.extend(b",p=");
                client_final_message.extend(Base64.encode(client_proof).bytes());
                next_state = ScramState::GotServerData { server_signature };
                ret = client_final_message;
            }
            _ => {
                return Err(MechanismError::InvalidState);
            }
        }
        self.state = next_state;
        Ok(ret)
    }

    fn success(&mut self, data: &[u8]) -> Result<(), MechanismError> {
        let frame = parse_frame(data).map_err(|_| MechanismError::CannotDecodeSuccessResponse)?;
        match self.state {
            ScramState::GotServerData {
                ref server_signature,
            } => {
                if let Some(err) = frame.get("e") {
                    return Err(MechanismError::ServerError(err.clone()));
                }
                let sig = frame
                    .get("v")
                    .ok_or(MechanismError::NoSignatureInSuccessResponse)?;
                let sig = Base64
                    .decode(sig)
                    .map_err(|_| MechanismError::CannotDecodeSuccessResponse)?;
                if sig == *server_signature {
                    Ok(())
                } else {
                    Err(MechanismError::InvalidSignatureInSuccessResponse)
                }
            }
            _ => Err(MechanismError::InvalidState),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scram::{Sha1, Sha256};

    #[test]
    fn scram_sha1_works() {
        // Source: https://wiki.xmpp.org/web/SASLandSCRAM-SHA-1
        let username = "user";
        let password = "pencil";
        let client_nonce = "fyko+d2lbbFgONRv9qkxdawL";
        let client_init = b"n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL";
        let server_init = b"r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096";
        let client_final =
            b"c=biws,r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,p=v0X8v3Bz2T0CJGbJQyF0X+HI4Ts=";
        let server_final = b"v=rmF9pqV8S7suAoZWja4dJRkFsKQ=";
        let mut mechanism = Scram::<Sha1>::new_with_nonce(
            username.to_owned(),
            password.to_owned(),
            None,
            client_nonce.to_owned(),
        );
        assert_eq!(mechanism.name(), "SCRAM-SHA-1");
        let init = mechanism.initial();
        assert_eq!(
            String::from_utf8(init.clone()).unwrap(),
            String::from_utf8(client_init[..].to_owned()).unwrap()
        );
        let resp = mechanism.response(&server_init[..]).unwrap();
        assert_eq!(
            String::from_utf8(resp.clone()).unwrap(),
            String::from_utf8(client_final[..].to_owned()).unwrap()
        );
        mechanism.success(&server_final[..]).unwrap();
    }

    #[test]
    fn scram_sha1_proof_matches_reference() {
        let mut mechanism = Scram::<Sha1>::new_with_nonce(
            "user".to_owned(),
            "pencil".to_owned(),
            None,
            "fyko+d2lbbFgONRv9qkxdawL".to_owned(),
        );
        mechanism.initial();
        let resp = mechanism
            .response(b"r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096")
            .unwrap();
        let resp = String::from_utf8(resp).unwrap();
        let proof = resp.rsplit_once(",p=").unwrap().1;
        assert_eq!(
            Base64.decode(proof).unwrap(),
            Base64.decode("v0X8v3Bz2T0CJGbJQyF0X+HI4Ts=").unwrap()
        );
    }

    #[test]
    fn scram_sha256_works() {
        // Source: RFC 7677
        let username = "user";
        let password = "pencil";
        let client_nonce = "rOprNGfwEbeRWgbNEkqO";
        let client_init = b"n,,n=user,r=rOprNGfwEbeRWgbNEkqO";
        let server_init = b"r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096";
        let client_final = b"c=biws,r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,p=dHzbZapWIk4jUhN+Ute9ytag9zjfMHgsqmmiz7AndVQ=";
        let server_final = b"v=6rriTRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4=";
        let mut mechanism = Scram::<Sha256>::new_with_nonce(
            username.to_owned(),
            password.to_owned(),
            None,
            client_nonce.to_owned(),
        );
        assert_eq!(mechanism.name(), "SCRAM-SHA-256");
        let init = mechanism.initial();
        assert_eq!(init, &client_init[..]);
        let resp = mechanism.response(&server_init[..]).unwrap();
        assert_eq!(resp, &client_final[..]);
        mechanism.success(&server_final[..]).unwrap();
    }

    #[test]
    fn authzid_and_escaping() {
        let mut mechanism = Scram::<Sha1>::new_with_nonce(
            "us=er,1".to_owned(),
            "pencil".to_owned(),
            Some("admin@example.org".to_owned()),
            "abc".to_owned(),
        );
        let init = mechanism.initial();
        assert_eq!(init, b"n,a=admin@example.org,n=us=3Der=2C1,r=abc");
        let resp = mechanism.response(b"r=abcdef,s=QSXCR+Q6sek8bf92,i=1").unwrap();
        let resp = String::from_utf8(resp).unwrap();
        let expected_c = Base64.encode("n,a=admin@example.org,");
        assert!(resp.starts_with(&format!("c={},r=abcdef,p=", expected_c)));
    }

    #[test]
    fn fresh_nonce_per_engine() {
        let credentials = Credentials::default()
            .with_username("user")
            .with_password("pencil");
        let mut a = Scram::<Sha1>::from_credentials(credentials.clone()).unwrap();
        let mut b = Scram::<Sha1>::from_credentials(credentials).unwrap();
        assert_ne!(a.initial(), b.initial());
    }

    #[test]
    fn missing_server_attributes() {
        let new = || {
            let mut mechanism = Scram::<Sha1>::new_with_nonce(
                "user".to_owned(),
                "pencil".to_owned(),
                None,
                "abc".to_owned(),
            );
            mechanism.initial();
            mechanism
        };
        assert_eq!(
            new().response(b"s=QSXCR+Q6sek8bf92,i=4096"),
            Err(MechanismError::NoServerNonce)
        );
        assert_eq!(
            new().response(b"r=abcdef,i=4096"),
            Err(MechanismError::NoServerSalt)
        );
        assert_eq!(
            new().response(b"r=abcdef,s=QSXCR+Q6sek8bf92"),
            Err(MechanismError::NoServerIterations)
        );
        assert_eq!(
            new().response(b"r=abcdef,s=QSXCR+Q6sek8bf92,i=many"),
            Err(MechanismError::InvalidIterationCount)
        );
        assert_eq!(
            new().response(b"r=abcdef,s=QSXCR+Q6sek8bf92,i=0"),
            Err(MechanismError::InvalidIterationCount)
        );
        assert_eq!(
            new().response(b"r=xyz,s=QSXCR+Q6sek8bf92,i=4096"),
            Err(MechanismError::NonceMismatch)
        );
    }

    #[test]
    fn bad_server_signature() {
        let mut mechanism = Scram::<Sha1>::new_with_nonce(
            "user".to_owned(),
            "pencil".to_owned(),
            None,
            "fyko+d2lbbFgONRv9qkxdawL".to_owned(),
        );
        mechanism.initial();
        mechanism
            .response(b"r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096")
            .unwrap();
        assert_eq!(
            mechanism.success(b"v=AAAApqV8S7suAoZWja4dJRkFsKQ="),
            Err(MechanismError::InvalidSignatureInSuccessResponse)
        );
        assert_eq!(
            mechanism.success(b"e=invalid-proof"),
            Err(MechanismError::ServerError(String::from("invalid-proof")))
        );
    }

    #[test]
    fn out_of_order() {
        let mut mechanism = Scram::<Sha1>::new_with_nonce(
            "user".to_owned(),
            "pencil".to_owned(),
            None,
            "abc".to_owned(),
        );
        assert_eq!(
            mechanism.response(b"r=abcdef,s=QSXCR+Q6sek8bf92,i=1"),
            Err(MechanismError::InvalidState)
        );
        assert_eq!(mechanism.success(b""), Err(MechanismError::InvalidState));
    }
}
