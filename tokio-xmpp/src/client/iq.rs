// Copyright (c) 2025 Jonas Schäfer <jonas@zombofant.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tracking of IQ requests until their response arrives.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use rand::{thread_rng, Rng};
use tokio::sync::oneshot;

use xmpp_parsers::{
    iq::{Iq, IqType},
    stanza_error::StanzaError,
};

use crate::{jid::Jid, minidom::Element};

pub(crate) fn make_id() -> String {
    let id: u64 = thread_rng().gen();
    format!("{}", id)
}

/// An IQ request payload
#[derive(Debug, Clone)]
pub enum IqRequest {
    /// Payload for a `type="get"` request
    Get(Element),

    /// Payload for a `type="set"` request
    Set(Element),
}

impl From<IqRequest> for IqType {
    fn from(other: IqRequest) -> IqType {
        match other {
            IqRequest::Get(v) => Self::Get(v),
            IqRequest::Set(v) => Self::Set(v),
        }
    }
}

/// An IQ response payload
#[derive(Debug)]
pub enum IqResponse {
    /// Payload for a `type="result"` response.
    Result(Option<Element>),

    /// Payload for a `type="error"` response.
    Error(StanzaError),
}

impl From<IqResponse> for IqType {
    fn from(other: IqResponse) -> IqType {
        match other {
            IqResponse::Result(v) => Self::Result(v),
            IqResponse::Error(v) => Self::Error(v),
        }
    }
}

/// Error enumeration for Iq sending failures
#[derive(Debug)]
pub enum IqFailure {
    /// The tracker was dropped, or the connection forgot every pending
    /// request, before the response was received.
    LostWorker,
}

impl fmt::Display for IqFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LostWorker => {
                f.write_str("disconnected from internal connection worker while sending IQ")
            }
        }
    }
}

impl Error for IqFailure {}

type IqKey = (Option<Jid>, String);
type IqMap = HashMap<IqKey, IqResponseSink>;

struct IqMapEntryHandle {
    key: IqKey,
    map: Weak<Mutex<IqMap>>,
}

impl Drop for IqMapEntryHandle {
    fn drop(&mut self) {
        let Some(map) = self.map.upgrade() else {
            return;
        };
        map.lock().remove(&self.key);
    }
}

/// Handle for awaiting an IQ response.
///
/// The `IqResponseToken` can be awaited and will generate a result once
/// the Iq response has been received. Note that an `Ok(_)` result does
/// **not** imply a successful execution of the remote command: It may
/// contain a [`IqResponse::Error`] variant.
///
/// There are no internal timeouts for Iq responses, combine the token with
/// [`tokio::time::timeout`].
///
/// Dropping (cancelling) an `IqResponseToken` removes the internal
/// bookkeeping required for tracking the response.
pub struct IqResponseToken {
    entry: Option<IqMapEntryHandle>,
    inner: oneshot::Receiver<IqResponse>,
}

impl Future for IqResponseToken {
    type Output = Result<IqResponse, IqFailure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(v)) => {
                // Drop the map entry handle to release some memory.
                self.entry.take();
                Poll::Ready(Ok(v))
            }
            Poll::Ready(Err(_)) => {
                log::warn!("IqResponseToken oneshot::Receiver returned receive error!");
                self.entry.take();
                Poll::Ready(Err(IqFailure::LostWorker))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

struct IqResponseSink {
    inner: oneshot::Sender<IqResponse>,
}

impl IqResponseSink {
    fn complete(self, resp: IqResponse) {
        let _: Result<_, _> = self.inner.send(resp);
    }
}

/// Utility struct to track IQ responses.
pub struct IqResponseTracker {
    map: Arc<Mutex<IqMap>>,
}

impl Default for IqResponseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IqResponseTracker {
    /// Create a new empty response tracker.
    pub fn new() -> Self {
        Self {
            map: Arc::new(Mutex::new(IqMap::new())),
        }
    }

    /// Attempt to handle an IQ stanza as IQ response.
    ///
    /// Returns the IQ stanza unharmed if it is not an IQ response matching
    /// any request which is still being tracked.
    pub fn handle_iq(&self, iq: Iq) -> ControlFlow<(), Iq> {
        let payload = match iq.payload {
            IqType::Error(error) => IqResponse::Error(error),
            IqType::Result(result) => IqResponse::Result(result),
            _ => return ControlFlow::Continue(iq),
        };
        let key = (iq.from, iq.id);
        let mut map = self.map.lock();
        match map.remove(&key) {
            None => {
                log::trace!("not handling IQ response from {:?} with id {:?}: no active tracker for this tuple", key.0, key.1);
                ControlFlow::Continue(Iq {
                    from: key.0,
                    id: key.1,
                    to: iq.to,
                    payload: payload.into(),
                })
            }
            Some(sink) => {
                sink.complete(payload);
                ControlFlow::Break(())
            }
        }
    }

    /// Allocate a new IQ response tracking handle.
    ///
    /// This modifies the IQ to assign a unique ID.
    pub fn allocate_iq_handle(
        &self,
        from: Option<Jid>,
        to: Option<Jid>,
        req: IqRequest,
    ) -> (Iq, IqResponseToken) {
        let mut map = self.map.lock();
        let mut key = (to, make_id());
        while map.contains_key(&key) {
            key.1 = make_id();
        }
        let (tx, rx) = oneshot::channel();
        let sink = IqResponseSink { inner: tx };
        let token = IqResponseToken {
            entry: Some(IqMapEntryHandle {
                key: key.clone(),
                map: Arc::downgrade(&self.map),
            }),
            inner: rx,
        };
        map.insert(key.clone(), sink);
        (
            Iq {
                from,
                to: key.0,
                id: key.1,
                payload: req.into(),
            },
            token,
        )
    }

    /// Fail every pending request with [`IqFailure::LostWorker`].
    pub fn clear(&self) {
        self.map.lock().clear();
    }

    /// Number of requests still waiting for their response.
    pub fn pending(&self) -> usize {
        self.map.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmpp_parsers::stanza_error::{DefinedCondition, ErrorType};

    fn ping() -> Element {
        Element::builder("ping", "urn:xmpp:ping").build()
    }

    #[tokio::test]
    async fn response_completes_token() {
        let tracker = IqResponseTracker::new();
        let (iq, token) = tracker.allocate_iq_handle(None, None, IqRequest::Get(ping()));
        assert_eq!(tracker.pending(), 1);
        let response = Iq::empty_result(None, iq.id.clone());
        assert_eq!(tracker.handle_iq(response), ControlFlow::Break(()));
        assert!(matches!(token.await, Ok(IqResponse::Result(None))));
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn error_response() {
        let tracker = IqResponseTracker::new();
        let (iq, token) = tracker.allocate_iq_handle(None, None, IqRequest::Set(ping()));
        let error = StanzaError::from_condition(ErrorType::Cancel, DefinedCondition::NotAllowed);
        let response = Iq::from_error(iq.id.clone(), error);
        assert_eq!(tracker.handle_iq(response), ControlFlow::Break(()));
        match token.await {
            Ok(IqResponse::Error(error)) => {
                assert_eq!(error.defined_condition, DefinedCondition::NotAllowed)
            }
            _ => panic!(),
        }
    }

    #[test]
    fn unrelated_response_is_returned() {
        let tracker = IqResponseTracker::new();
        let (iq, _token) = tracker.allocate_iq_handle(None, None, IqRequest::Get(ping()));
        let spoofed = Iq::empty_result(None, iq.id.clone())
            .with_from(Jid::new("mallory@example.org").unwrap());
        assert!(matches!(tracker.handle_iq(spoofed), ControlFlow::Continue(_)));
        let request = Iq::from_get("abc", crate::parsers::roster::Roster::default());
        assert!(matches!(tracker.handle_iq(request), ControlFlow::Continue(_)));
        assert_eq!(tracker.pending(), 1);
    }

    #[test]
    fn dropping_token_forgets_request() {
        let tracker = IqResponseTracker::new();
        let (_iq, token) = tracker.allocate_iq_handle(None, None, IqRequest::Get(ping()));
        assert_eq!(tracker.pending(), 1);
        drop(token);
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn clear_fails_pending() {
        let tracker = IqResponseTracker::new();
        let (_iq, token) = tracker.allocate_iq_handle(None, None, IqRequest::Get(ping()));
        tracker.clear();
        assert!(matches!(token.await, Err(IqFailure::LostWorker)));
    }
}
