//! Deadline-bounded socket primitives.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::budget::Budget;
use crate::error::Error;

mod tcp;
#[cfg(test)]
pub(crate) mod script;

pub use tcp::{TcpTransport, TransportOptions};

/// A stream transport whose every blocking step is bounded by a [`Budget`].
///
/// `send` and `receive` move at most one partial transfer per call; callers
/// loop. Implementations fail with [`Error::Timeout`] when readiness does not
/// arrive within the remaining budget.
pub trait Transport: Send {
    /// Open a connection to `addr`.
    fn connect(&mut self, addr: SocketAddr, budget: &Budget) -> Result<(), Error>;

    /// Send a prefix of `buf`, returning how many bytes were written.
    fn send(&mut self, buf: &[u8], budget: &Budget) -> Result<usize, Error>;

    /// Read into `buf`, returning the byte count. Zero means the peer closed.
    fn receive(&mut self, buf: &mut [u8], budget: &Budget) -> Result<usize, Error>;

    /// Shut down and release the connection. Repeated calls are no-ops.
    fn close(&mut self);
}

/// Builds a fresh transport whenever a client rebuilds its connection.
pub type TransportFactory<T> = Arc<dyn Fn() -> T + Send + Sync>;
