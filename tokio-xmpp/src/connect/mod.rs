//! `Connection` is what the client logic needs from a negotiated XMPP stream

use std::future::Future;

use xmpp_parsers::jid::Jid;

use crate::client::iq::IqRequest;
use crate::minidom::Element;
use crate::Error;

mod channel;
pub use channel::ChannelConnection;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No stream is open.
    Disconnected,
    /// The transport is being set up.
    Connecting,
    /// A stream is open but not authenticated yet.
    Connected,
    /// SASL succeeded on this stream.
    Authenticated,
}

/// Trait implemented by a negotiated XMPP stream, as consumed by the SASL
/// negotiator and the roster.
///
/// Incoming elements are not read through this trait: whoever owns the
/// stream dispatches each received element to the handlers, in arrival
/// order, from a single task.
pub trait Connection: Send + Sync + 'static {
    /// Enqueue a top-level element for transmission. Ordering with respect
    /// to other sends on the same connection is preserved.
    fn send(&self, element: Element) -> Result<(), Error>;

    /// Send an IQ request and wait for its correlated response.
    ///
    /// Resolves to the payload of the `type="result"` response, to
    /// [`Error::Stanza`] for a `type="error"` response, and to
    /// [`Error::NoResponse`] when nothing arrives in time.
    fn query(
        &self,
        to: Option<Jid>,
        request: IqRequest,
    ) -> impl Future<Output = Result<Option<Element>, Error>> + Send;

    /// The domain of the server this connection is established with.
    fn domain(&self) -> String;

    /// The full JID bound to this stream, once resource binding happened.
    fn bound_jid(&self) -> Option<Jid>;

    /// The current state of this connection.
    fn status(&self) -> ConnectionStatus;

    /// Mark the stream as authenticated and restart it, so that stream
    /// features get renegotiated.
    fn restart_authenticated(&self) -> Result<(), Error>;
}
