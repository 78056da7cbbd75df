//! http-reactor: a pooled HTTP/1.1 client engine for high request rates
//! against a fixed set of upstream endpoints.
//!
//! Each [`Client`] owns one non-blocking TCP connection and one fixed-size
//! [`Message`] buffer. A request is written straight into the buffer, sent,
//! and the response is parsed incrementally into the same buffer without
//! intermediate copies. Every blocking step is charged against a
//! microsecond [`Budget`], so no call waits past its timeout.
//!
//! A [`Pool`] builds its clients up front and lends each to at most one
//! caller at a time. It never blocks: when every client is leased,
//! [`Pool::get_client`] fails with [`Error::PoolExhausted`].
//!
//! Faults are never retried inside the failing call. A client that saw a
//! timeout, socket error or malformed response reconnects on its next
//! [`send`](Client::send).

pub mod budget;
pub mod buffer;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod metrics;
pub mod pool;
pub mod transport;

// Configuration
pub use config::{Config, ConfigBuilder};

// Errors
pub use error::Error;

/// Time budget for one exchange.
pub use budget::Budget;

// Buffer and message
pub use buffer::{MessageBuffer, Region, View};
pub use message::{BodyView, BodyWriter, Message};

// Client and pool
pub use client::{Client, ClientState};
pub use pool::{Pool, PooledClient};

// Endpoints
pub use endpoint::{Endpoints, FixedEndpoint, RoundRobin};

// Transport
pub use transport::{TcpTransport, Transport, TransportFactory, TransportOptions};

/// Re-exported wire-format crate.
pub use protocol_http;
