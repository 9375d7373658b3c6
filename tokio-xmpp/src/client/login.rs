// Copyright (c) 2025 xmpp-rs contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sasl::client::mechanisms::{Anonymous, Plain, Scram};
use sasl::client::{Mechanism, MechanismError};
use sasl::common::scram::{Sha1, Sha256};
use sasl::common::Credentials;
use tokio::sync::oneshot;
use xmpp_parsers::sasl::{Auth, Mechanism as XMPPMechanism, Nonza, Response};
use xmpp_parsers::stream_features::{SaslMechanisms, StreamFeatures};
use xmpp_parsers::{ns, FromElementError};

use crate::connect::{Connection, ConnectionStatus};
use crate::error::{AuthError, Error, FailureCause, ProtocolError};
use crate::minidom::Element;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Mechanisms tried by [`SaslNegotiator::authenticate`], most preferred
/// first.
pub const DEFAULT_MECHANISMS: [&str; 6] = [
    "SCRAM-SHA-1",
    "DIGEST-MD5",
    "GSSAPI",
    "CRAM-MD5",
    "PLAIN",
    "ANONYMOUS",
];

type Engine = Box<dyn Mechanism + Send>;

/// Keep the mechanisms of `preferred` which the server supports, in the
/// order of `preferred`.
pub fn negotiate_mechanisms<S: AsRef<str>>(
    preferred: &[S],
    server: &HashSet<String>,
) -> Vec<String> {
    preferred
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| server.contains(*name))
        .map(String::from)
        .collect()
}

fn build_mechanism(name: &str, credentials: &Credentials) -> Option<(XMPPMechanism, Engine)> {
    let Ok(mechanism) = XMPPMechanism::from_str(name) else {
        log::debug!("Skipping unknown SASL mechanism {}", name);
        return None;
    };
    let credentials = credentials.clone();
    let engine: Result<Engine, MechanismError> = match mechanism {
        XMPPMechanism::ScramSha1 => {
            Scram::<Sha1>::from_credentials(credentials).map(|m| Box::new(m) as Engine)
        }
        XMPPMechanism::ScramSha256 => {
            Scram::<Sha256>::from_credentials(credentials).map(|m| Box::new(m) as Engine)
        }
        XMPPMechanism::Plain => Plain::from_credentials(credentials).map(|m| Box::new(m) as Engine),
        XMPPMechanism::Anonymous => {
            Anonymous::from_credentials(credentials).map(|m| Box::new(m) as Engine)
        }
        XMPPMechanism::DigestMd5 | XMPPMechanism::Gssapi | XMPPMechanism::CramMd5 => {
            log::debug!("Skipping SASL mechanism {}: not implemented", name);
            return None;
        }
    };
    match engine {
        Ok(engine) => Some((mechanism, engine)),
        Err(e) => {
            log::debug!("Skipping SASL mechanism {}: {}", name, e);
            None
        }
    }
}

struct Attempt {
    id: u64,
    mechanism: Engine,
    completion: Option<oneshot::Sender<Result<(), Error>>>,
}

impl Attempt {
    fn complete(mut self, result: Result<(), Error>) {
        if let Some(completion) = self.completion.take() {
            // The caller may have given up already.
            let _ = completion.send(result);
        }
    }
}

#[derive(Default)]
struct State {
    server_mechanisms: HashSet<String>,
    attempt: Option<Attempt>,
    last: Option<(Vec<String>, Credentials)>,
    next_id: u64,
}

/// Drives SASL authentication on a [`Connection`].
///
/// The task reading the stream hands every received element to
/// [`SaslNegotiator::handle_element`], while application code awaits one of
/// the `authenticate*` methods. Only one attempt is in flight at a time,
/// starting a new one supersedes the previous.
pub struct SaslNegotiator<C: Connection> {
    connection: Arc<C>,
    timeout: Duration,
    preferred: Vec<String>,
    state: Mutex<State>,
}

impl<C: Connection> SaslNegotiator<C> {
    /// Create a negotiator authenticating on `connection`.
    pub fn new(connection: Arc<C>) -> Self {
        SaslNegotiator {
            connection,
            timeout: DEFAULT_TIMEOUT,
            preferred: DEFAULT_MECHANISMS.iter().map(|s| String::from(*s)).collect(),
            state: Mutex::new(State::default()),
        }
    }

    /// How long to wait for the server to conclude an attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the mechanisms tried by [`SaslNegotiator::authenticate`].
    pub fn with_preferred_mechanisms<I, S>(mut self, mechanisms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred = mechanisms.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the set of mechanisms the server advertised.
    pub fn set_server_mechanisms<I, S>(&self, mechanisms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().server_mechanisms = mechanisms.into_iter().map(Into::into).collect();
    }

    /// Authenticate with a username and a password, using the preferred
    /// mechanisms the server supports.
    pub async fn authenticate(
        &self,
        authzid: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<(), Error> {
        let mut credentials = Credentials::default()
            .with_username(username)
            .with_password(password);
        if let Some(authzid) = authzid {
            credentials = credentials.with_authzid(authzid);
        }
        let mechanisms = self.preferred.clone();
        self.run(mechanisms, credentials).await
    }

    /// Authenticate with the ANONYMOUS mechanism only.
    pub async fn authenticate_anonymously(&self) -> Result<(), Error> {
        self.run(vec![String::from("ANONYMOUS")], Credentials::default())
            .await
    }

    /// Repeat the last successful authentication, typically on a new stream
    /// after a reconnection.
    pub async fn reauthenticate(&self) -> Result<(), Error> {
        let (mechanisms, credentials) = self.state.lock().last.clone().ok_or(Error::InvalidState)?;
        self.run(mechanisms, credentials).await
    }

    /// Send the `<auth/>` of a new attempt, superseding any pending one.
    fn start(
        &self,
        mechanisms: &[String],
        credentials: &Credentials,
    ) -> Result<(u64, oneshot::Receiver<Result<(), Error>>), Error> {
        let mut state = self.state.lock();
        if self.connection.status() != ConnectionStatus::Connected {
            return Err(Error::InvalidState);
        }
        let candidates = negotiate_mechanisms(mechanisms, &state.server_mechanisms);
        let Some((name, mut mechanism)) = candidates
            .iter()
            .find_map(|name| build_mechanism(name, credentials))
        else {
            return Err(AuthError::NoMechanism.into());
        };
        let data = mechanism.initial();
        let (sender, receiver) = oneshot::channel();
        state.next_id += 1;
        let id = state.next_id;
        state.attempt = Some(Attempt {
            id,
            mechanism,
            completion: Some(sender),
        });
        if let Err(e) = self.connection.send(Auth { mechanism: name, data }.into()) {
            state.attempt = None;
            return Err(e);
        }
        log::debug!("Authenticating with SASL mechanism {}", name);
        Ok((id, receiver))
    }

    /// Give up on attempt `id` once its time is over. A result delivered
    /// before the attempt got cleared is still returned.
    fn expire(
        &self,
        id: u64,
        receiver: &mut oneshot::Receiver<Result<(), Error>>,
    ) -> Result<(), Error> {
        {
            let mut state = self.state.lock();
            if state.attempt.as_ref().map(|attempt| attempt.id) == Some(id) {
                state.attempt = None;
            }
        }
        match receiver.try_recv() {
            Ok(result) => result,
            Err(_) => Err(AuthError::Failed(FailureCause::Timeout).into()),
        }
    }

    async fn run(&self, mechanisms: Vec<String>, credentials: Credentials) -> Result<(), Error> {
        let (id, mut receiver) = self.start(&mechanisms, &credentials)?;

        let result = match tokio::time::timeout(self.timeout, &mut receiver).await {
            Ok(Ok(result)) => result,
            // Superseded by a newer attempt.
            Ok(Err(_)) => Err(Error::InvalidState),
            Err(_) => self.expire(id, &mut receiver),
        };

        match &result {
            Ok(()) => {
                log::debug!("SASL authentication succeeded");
                self.state.lock().last = Some((mechanisms, credentials));
            }
            Err(e) => log::warn!("SASL authentication failed: {}", e),
        }
        result
    }

    /// Handle an element received on the stream.
    ///
    /// SASL nonzas and `<mechanisms/>` are consumed. A `<stream:features/>`
    /// element updates the server mechanisms and is handed back, as are
    /// all other elements.
    pub fn handle_element(&self, element: Element) -> ControlFlow<(), Element> {
        if element.is("features", ns::STREAM) {
            match StreamFeatures::try_from(element.clone()) {
                Ok(features) => self.set_server_mechanisms(features.sasl_mechanisms.mechanisms),
                Err(e) => log::warn!("Received invalid stream features: {}", e),
            }
            return ControlFlow::Continue(element);
        }
        if element.is("mechanisms", ns::SASL) {
            match SaslMechanisms::try_from(element) {
                Ok(mechanisms) => self.set_server_mechanisms(mechanisms.mechanisms),
                Err(e) => log::warn!("Received invalid SASL mechanisms: {}", e),
            }
            return ControlFlow::Break(());
        }

        let nonza = match Nonza::try_from(element) {
            Ok(nonza) => Ok(nonza),
            Err(FromElementError::Mismatch(element)) => return ControlFlow::Continue(element),
            Err(FromElementError::Invalid(e)) => Err(e),
        };

        let mut state = self.state.lock();
        let Some(attempt) = state.attempt.as_mut() else {
            log::warn!("Received a SASL element while no authentication is in progress");
            return ControlFlow::Break(());
        };
        let outcome = match nonza {
            Ok(Nonza::Challenge(challenge)) => match attempt.mechanism.response(&challenge.data) {
                Ok(data) => match self.connection.send(Response { data }.into()) {
                    Ok(()) => return ControlFlow::Break(()),
                    Err(e) => Err(e),
                },
                Err(e) => Err(AuthError::from(e).into()),
            },
            Ok(Nonza::Success(success)) => match attempt.mechanism.success(&success.data) {
                Ok(()) => self.connection.restart_authenticated(),
                Err(e) => Err(AuthError::from(e).into()),
            },
            Ok(Nonza::Failure(failure)) => Err(AuthError::from(failure).into()),
            Err(e) => Err(ProtocolError::Parsers(e).into()),
        };
        if let Some(attempt) = state.attempt.take() {
            attempt.complete(outcome);
        }
        ControlFlow::Break(())
    }

    /// Fail the attempt in progress, if any, with [`Error::Disconnected`].
    ///
    /// Must be called by whoever notices the stream went away.
    pub fn connection_lost(&self) {
        let mut state = self.state.lock();
        state.server_mechanisms.clear();
        if let Some(attempt) = state.attempt.take() {
            attempt.complete(Err(Error::Disconnected));
        }
    }
}
