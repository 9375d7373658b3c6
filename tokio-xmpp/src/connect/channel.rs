// Copyright (c) 2025 Jonas Schäfer <jonas@zombofant.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use xmpp_parsers::iq::Iq;
use xmpp_parsers::jid::Jid;
use xmpp_parsers::ns;

use super::{Connection, ConnectionStatus};
use crate::client::iq::{IqRequest, IqResponse, IqResponseTracker};
use crate::minidom::Element;
use crate::Error;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

struct State {
    status: ConnectionStatus,
    bound_jid: Option<Jid>,
    restarts: usize,
}

/// A [`Connection`] backed by an in-process channel.
///
/// Every element sent through it comes out of the receiver returned by
/// [`ChannelConnection::new`], and every element read from the peer must be
/// passed to [`ChannelConnection::handle_incoming`] first, so that IQ
/// responses reach their waiting [`Connection::query`].
pub struct ChannelConnection {
    domain: String,
    outgoing: mpsc::UnboundedSender<Element>,
    tracker: IqResponseTracker,
    query_timeout: Duration,
    state: Mutex<State>,
}

impl ChannelConnection {
    /// Create a connected but unauthenticated connection to `domain`.
    pub fn new<D: Into<String>>(domain: D) -> (Self, mpsc::UnboundedReceiver<Element>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ChannelConnection {
            domain: domain.into(),
            outgoing: tx,
            tracker: IqResponseTracker::new(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            state: Mutex::new(State {
                status: ConnectionStatus::Connected,
                bound_jid: None,
                restarts: 0,
            }),
        };
        (connection, rx)
    }

    /// Set how long [`Connection::query`] waits for a response.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the JID bound to this stream.
    pub fn with_bound_jid(self, jid: Jid) -> Self {
        self.state.lock().bound_jid = Some(jid);
        self
    }

    /// Change the status of this connection.
    ///
    /// Going to [`ConnectionStatus::Disconnected`] fails every pending query.
    pub fn set_status(&self, status: ConnectionStatus) {
        self.state.lock().status = status;
        if status == ConnectionStatus::Disconnected {
            self.tracker.clear();
        }
    }

    /// How many times the stream was restarted after authentication.
    pub fn restarts(&self) -> usize {
        self.state.lock().restarts
    }

    /// Route an element received from the peer.
    ///
    /// IQ responses to a pending query are consumed, anything else is handed
    /// back for the other handlers.
    pub fn handle_incoming(&self, element: Element) -> ControlFlow<(), Element> {
        if !element.is("iq", ns::DEFAULT_NS) {
            return ControlFlow::Continue(element);
        }
        let mut iq = match Iq::try_from(element.clone()) {
            Ok(iq) => iq,
            Err(e) => {
                log::warn!("Received invalid IQ: {}", e);
                return ControlFlow::Continue(element);
            }
        };
        // A response from our own account is addressed as if it came from
        // the server itself.
        if let (Some(from), Some(own)) = (&iq.from, self.bound_jid()) {
            if from.to_bare() == own.to_bare() && from.resource().is_none() {
                iq.from = None;
            }
        }
        match self.tracker.handle_iq(iq) {
            ControlFlow::Break(()) => ControlFlow::Break(()),
            ControlFlow::Continue(_) => ControlFlow::Continue(element),
        }
    }
}

impl Connection for ChannelConnection {
    fn send(&self, element: Element) -> Result<(), Error> {
        if self.status() == ConnectionStatus::Disconnected {
            return Err(Error::Disconnected);
        }
        self.outgoing.send(element).map_err(|_| Error::Disconnected)
    }

    fn query(
        &self,
        to: Option<Jid>,
        request: IqRequest,
    ) -> impl Future<Output = Result<Option<Element>, Error>> + Send {
        let (iq, token) = self.tracker.allocate_iq_handle(None, to, request);
        let sent = self.send(iq.into());
        let timeout = self.query_timeout;
        async move {
            sent?;
            match tokio::time::timeout(timeout, token).await {
                Ok(Ok(IqResponse::Result(payload))) => Ok(payload),
                Ok(Ok(IqResponse::Error(error))) => Err(Error::Stanza(error)),
                Ok(Err(failure)) => Err(Error::Iq(failure)),
                Err(_) => Err(Error::NoResponse),
            }
        }
    }

    fn domain(&self) -> String {
        self.domain.clone()
    }

    fn bound_jid(&self) -> Option<Jid> {
        self.state.lock().bound_jid.clone()
    }

    fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    fn restart_authenticated(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.status == ConnectionStatus::Disconnected {
            return Err(Error::Disconnected);
        }
        state.status = ConnectionStatus::Authenticated;
        state.restarts += 1;
        log::debug!("Restarting stream after authentication");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmpp_parsers::stanza_error::{DefinedCondition, ErrorType, StanzaError};

    fn ping() -> Element {
        Element::builder("ping", "urn:xmpp:ping").build()
    }

    #[tokio::test]
    async fn query_gets_result() {
        let (connection, mut rx) = ChannelConnection::new("example.org");
        let connection = std::sync::Arc::new(connection);
        let query = tokio::spawn({
            let connection = connection.clone();
            async move { connection.query(None, IqRequest::Get(ping())).await }
        });
        let request = Iq::try_from(rx.recv().await.unwrap()).unwrap();
        let result = Element::builder("pong", "urn:xmpp:ping").build();
        let response = Iq {
            from: None,
            to: None,
            id: request.id,
            payload: xmpp_parsers::iq::IqType::Result(Some(result.clone())),
        };
        assert!(connection.handle_incoming(response.into()).is_break());
        assert_eq!(query.await.unwrap().unwrap(), Some(result));
    }

    #[tokio::test]
    async fn response_from_own_bare_jid() {
        let (connection, mut rx) = ChannelConnection::new("example.org");
        let connection = std::sync::Arc::new(
            connection.with_bound_jid(Jid::new("juliet@example.org/balcony").unwrap()),
        );
        let query = tokio::spawn({
            let connection = connection.clone();
            async move { connection.query(None, IqRequest::Get(ping())).await }
        });
        let request = Iq::try_from(rx.recv().await.unwrap()).unwrap();
        let response =
            Iq::empty_result(None, request.id).with_from(Jid::new("juliet@example.org").unwrap());
        assert!(connection.handle_incoming(response.into()).is_break());
        assert_eq!(query.await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn query_gets_stanza_error() {
        let (connection, mut rx) = ChannelConnection::new("example.org");
        let connection = std::sync::Arc::new(connection);
        let query = tokio::spawn({
            let connection = connection.clone();
            async move { connection.query(None, IqRequest::Set(ping())).await }
        });
        let request = Iq::try_from(rx.recv().await.unwrap()).unwrap();
        let error = StanzaError::from_condition(ErrorType::Cancel, DefinedCondition::Forbidden);
        assert!(connection
            .handle_incoming(Iq::from_error(request.id, error).into())
            .is_break());
        match query.await.unwrap() {
            Err(Error::Stanza(error)) => {
                assert_eq!(error.defined_condition, DefinedCondition::Forbidden)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn query_times_out() {
        let (connection, _rx) = ChannelConnection::new("example.org");
        let connection = connection.with_query_timeout(Duration::from_secs(5));
        let result = connection.query(None, IqRequest::Get(ping())).await;
        assert!(matches!(result, Err(Error::NoResponse)));
    }

    #[tokio::test]
    async fn disconnect_fails_pending_queries() {
        let (connection, mut rx) = ChannelConnection::new("example.org");
        let connection = std::sync::Arc::new(connection);
        let query = tokio::spawn({
            let connection = connection.clone();
            async move { connection.query(None, IqRequest::Get(ping())).await }
        });
        rx.recv().await.unwrap();
        connection.set_status(ConnectionStatus::Disconnected);
        assert!(matches!(query.await.unwrap(), Err(Error::Iq(_))));
        assert!(matches!(
            connection.send(ping()),
            Err(Error::Disconnected)
        ));
    }

    #[test]
    fn restart_marks_authenticated() {
        let (connection, _rx) = ChannelConnection::new("example.org");
        assert_eq!(connection.status(), ConnectionStatus::Connected);
        connection.restart_authenticated().unwrap();
        assert_eq!(connection.status(), ConnectionStatus::Authenticated);
        assert_eq!(connection.restarts(), 1);
    }

    #[test]
    fn non_iq_is_handed_back() {
        let (connection, _rx) = ChannelConnection::new("example.org");
        let message: Element = "<message xmlns='jabber:client'/>".parse().unwrap();
        assert!(connection.handle_incoming(message).is_continue());
    }
}
