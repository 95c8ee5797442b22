//! # quay-channel
//!
//! Channel Participation Client: authenticated administrative calls to
//! a running node for channel join/leave and ledger introspection.
//!
//! Every call opens its own mutual-TLS connection and is synchronous
//! request/response; there is no connection pool. The admin protocol's
//! request and response shapes are the target platform's own and are
//! treated as a fixed external wire contract.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod error;
mod transport;
mod types;

pub use client::ChannelClient;
pub use error::ChannelError;
pub use transport::{
    AdminTransport, HttpAdminTransport, MockAdminTransport, RecordedRequest, TlsIdentity,
};
pub use types::{BlockRef, ChannelInfo, ChannelSummary};

/// Result type for participation calls
pub type ChannelResult<T> = Result<T, ChannelError>;
