//! Low-level [XMPP](https://xmpp.org/) client plumbing with asynchronous I/O using [tokio](https://tokio.rs/).
//!
//! For the roster and other client state, try the [xmpp crate](https://docs.rs/xmpp).
//!
//! # Getting started
//!
//! Everything here talks to the server through the [`connect::Connection`]
//! trait. [`connect::ChannelConnection`] implements it on top of an
//! in-process channel: elements sent through it come out of a receiver,
//! and whoever reads the stream hands received elements back to
//! [`connect::ChannelConnection::handle_incoming`] and then to the
//! [`client::SaslNegotiator`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_xmpp::client::SaslNegotiator;
//! use tokio_xmpp::connect::ChannelConnection;
//!
//! # async fn run() -> Result<(), tokio_xmpp::Error> {
//! let (connection, mut outgoing) = ChannelConnection::new("example.org");
//! let negotiator = SaslNegotiator::new(Arc::new(connection));
//! negotiator.set_server_mechanisms(["SCRAM-SHA-1", "PLAIN"]);
//! negotiator.authenticate(None, "juliet", "r0m30").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # More information
//!
//! You can find more information on our website [xmpp.rs](https://xmpp.rs/) or by joining our chatroom [chat@xmpp.rs](xmpp:chat@xmpp.rs?join).

#![deny(unsafe_code, missing_docs, bare_trait_objects)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod client;
pub mod connect;

/// Detailed error types
pub mod error;

#[doc(inline)]
/// Generic tokio_xmpp Error
pub use crate::error::Error;

// Re-exports
pub use minidom;
pub use xmpp_parsers as parsers;
pub use xmpp_parsers::jid;
