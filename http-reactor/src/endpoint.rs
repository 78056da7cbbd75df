//! Endpoint selection.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;

/// Chooses the address for each new connection.
pub trait Endpoints: Send + Sync {
    fn next(&self) -> SocketAddr;
}

/// Always the same address.
#[derive(Debug, Clone, Copy)]
pub struct FixedEndpoint(pub SocketAddr);

impl Endpoints for FixedEndpoint {
    fn next(&self) -> SocketAddr {
        self.0
    }
}

/// Cycles through a static address list, shared lock-free across clients.
#[derive(Debug)]
pub struct RoundRobin {
    addrs: Vec<SocketAddr>,
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new(addrs: Vec<SocketAddr>) -> Result<Self, Error> {
        if addrs.is_empty() {
            return Err(Error::InvalidConfiguration(
                "round robin needs at least one endpoint".into(),
            ));
        }
        Ok(Self {
            addrs,
            counter: AtomicUsize::new(0),
        })
    }

    /// Resolve `host` once and cycle through every address it maps to.
    pub fn from_dns(host: &str, port: u16) -> Result<Self, Error> {
        let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        tracing::debug!(host, port, resolved = addrs.len(), "resolved endpoints");
        Self::new(addrs)
    }

    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }
}

impl Endpoints for RoundRobin {
    fn next(&self) -> SocketAddr {
        let i = self.counter.fetch_add(1, Ordering::Relaxed);
        self.addrs[i % self.addrs.len()]
    }
}
