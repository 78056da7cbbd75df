//! One connection plus one message buffer, with lazy connect and
//! reconnect-on-next-use after faults.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::budget::Budget;
use crate::config::Config;
use crate::endpoint::Endpoints;
use crate::error::Error;
use crate::message::{BodyView, BodyWriter, Message};
use crate::metrics;
use crate::transport::{TcpTransport, Transport, TransportFactory};

/// Connection state of a [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Connected,
    Faulted,
}

/// A single-connection HTTP/1.1 client.
///
/// Write a request, call [`send`](Client::send), read the response, then
/// [`recycle`](Client::recycle) before the next request. The connection is
/// opened on the first `send`. A failed exchange leaves the client
/// [`Faulted`](ClientState::Faulted); the next `send` replaces the transport
/// and reconnects. A response that does not allow keep-alive, or a
/// connection older than the configured expiry, also causes a fresh
/// connection on the next `send`.
pub struct Client<T: Transport = TcpTransport> {
    message: Message,
    transport: T,
    factory: TransportFactory<T>,
    endpoints: Arc<dyn Endpoints>,
    endpoint: Option<SocketAddr>,
    state: ClientState,
    connected_at: Option<Instant>,
    connect_timeout: Duration,
    send_timeout: Duration,
    expiry: Option<Duration>,
}

impl<T: Transport> Client<T> {
    pub fn new(
        endpoints: Arc<dyn Endpoints>,
        config: &Config,
        factory: TransportFactory<T>,
    ) -> Result<Self, Error> {
        let message = Message::new(config.buffer_size, config.max_headers_size)?;
        Ok(Self {
            message,
            transport: factory(),
            factory,
            endpoints,
            endpoint: None,
            state: ClientState::Disconnected,
            connected_at: None,
            connect_timeout: config.connect_timeout,
            send_timeout: config.send_timeout,
            expiry: config.connection_expiry,
        })
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// The endpoint of the current or most recent connection.
    pub fn endpoint(&self) -> Option<SocketAddr> {
        self.endpoint
    }

    pub fn connected_at(&self) -> Option<Instant> {
        self.connected_at
    }

    /// Whether the open connection has outlived the configured expiry.
    pub fn is_expired(&self) -> bool {
        match (self.expiry, self.connected_at) {
            (Some(expiry), Some(at)) => at.elapsed() > expiry,
            _ => false,
        }
    }

    // ── Request ──────────────────────────────────────────────────────

    pub fn write_message_start(&mut self, line: &str) -> Result<(), Error> {
        self.message.write_message_start(line)
    }

    pub fn write_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.message.write_header(name, value)
    }

    pub fn write_content_length(&mut self) -> Result<(), Error> {
        self.message.write_content_length()
    }

    pub fn write_body(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.message.write_body(bytes)
    }

    pub fn body_writer(&mut self) -> BodyWriter<'_> {
        self.message.body_writer()
    }

    // ── Response ─────────────────────────────────────────────────────

    pub fn status(&self) -> Option<&str> {
        self.message.status()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.message.status_code()
    }

    pub fn body(&self) -> &[u8] {
        self.message.body()
    }

    pub fn body_view(&mut self) -> BodyView<'_> {
        self.message.body_view()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    /// Reset the message for the next request. The connection is untouched.
    pub fn recycle(&mut self) {
        self.message.recycle();
    }

    // ── Exchange ─────────────────────────────────────────────────────

    /// Perform one request/response exchange.
    ///
    /// Errors are returned unchanged. Those that leave the connection in an
    /// unknown state fault the client; it reconnects on the next call, never
    /// inside this one.
    pub fn send(&mut self) -> Result<(), Error> {
        match self.exchange() {
            Ok(()) => {
                metrics::EXCHANGES.increment();
                if !self.message.should_keep_alive() {
                    self.rebuild("connection not kept alive");
                } else if self.is_expired() {
                    metrics::EXPIRED.increment();
                    self.rebuild("connection expired");
                }
                Ok(())
            }
            Err(e) => {
                metrics::EXCHANGE_ERRORS.increment();
                if e.is_timeout() {
                    metrics::TIMEOUTS.increment();
                }
                if e.poisons_connection() {
                    self.state = ClientState::Faulted;
                    metrics::FAULTS.increment();
                    tracing::warn!(endpoint = ?self.endpoint, error = %e, "client faulted");
                }
                Err(e)
            }
        }
    }

    fn exchange(&mut self) -> Result<(), Error> {
        if self.state == ClientState::Faulted {
            self.rebuild("faulted");
        }
        if self.state == ClientState::Connected && self.is_expired() {
            metrics::EXPIRED.increment();
            self.rebuild("connection expired");
        }
        if self.state != ClientState::Connected {
            self.connect()?;
        }
        self.message
            .send(&mut self.transport, Budget::new(self.send_timeout))
    }

    fn connect(&mut self) -> Result<(), Error> {
        self.state = ClientState::Connecting;
        let addr = self.endpoints.next();
        self.endpoint = Some(addr);

        if let Err(e) = self
            .transport
            .connect(addr, &Budget::new(self.connect_timeout))
        {
            metrics::CONNECT_ERRORS.increment();
            return Err(e);
        }

        self.state = ClientState::Connected;
        self.connected_at = Some(Instant::now());
        metrics::CONNECTS.increment();
        tracing::debug!(endpoint = %addr, "connected");
        Ok(())
    }

    /// Drop the current transport and start over from a fresh one.
    fn rebuild(&mut self, reason: &'static str) {
        self.transport.close();
        self.transport = (self.factory)();
        self.state = ClientState::Disconnected;
        self.connected_at = None;
        metrics::REBUILDS.increment();
        tracing::debug!(endpoint = ?self.endpoint, reason, "rebuilt transport");
    }

    /// Close the connection. The client reconnects if used again.
    pub fn close(&mut self) {
        self.transport.close();
        self.state = ClientState::Disconnected;
        self.connected_at = None;
    }
}
