use std::io;
use std::time::Duration;

use protocol_http::ParseError;
use thiserror::Error;

use crate::buffer::Region;

/// Errors returned by the client engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A poll or transfer loop ran out of time budget.
    #[error("{operation} timeout {budget:?}")]
    Timeout {
        operation: &'static str,
        budget: Duration,
    },
    /// Socket-level failure during connect, send or receive.
    #[error("connection: {0}")]
    Connection(#[from] io::Error),
    /// The response violated HTTP/1.1 framing.
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
    /// The response did not fit in the body region.
    #[error("response too large for {capacity} byte body region")]
    ResponseTooLarge { capacity: usize },
    /// A request write did not fit in its region.
    #[error("{region} region overflow: capacity {capacity} bytes")]
    BufferOverflow { region: Region, capacity: usize },
    /// A request line, header name or header value that cannot go on the
    /// wire as given.
    #[error("invalid request {0}")]
    InvalidRequest(&'static str),
    /// Every pooled client is leased.
    #[error("no clients available")]
    PoolExhausted,
    /// Rejected construction parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// True when the connection's stream position is unknown after this
    /// error, so the socket must not be reused.
    pub fn poisons_connection(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. }
                | Error::Connection(_)
                | Error::Parse(_)
                | Error::ResponseTooLarge { .. }
        )
    }
}
