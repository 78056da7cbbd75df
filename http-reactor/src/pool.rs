//! Fixed-size client pool with non-blocking admission.
//!
//! All clients are built up front and parked in a lock-free queue. A lease
//! moves one out; dropping the lease recycles it and moves it back. When the
//! queue is empty, [`Pool::get_client`] fails at once with
//! [`Error::PoolExhausted`] rather than waiting.
//!
//! # Example
//!
//! ```no_run
//! use http_reactor::{Config, FixedEndpoint, Pool};
//!
//! # fn example() -> Result<(), http_reactor::Error> {
//! let pool = Pool::new(FixedEndpoint("127.0.0.1:8080".parse().unwrap()), Config::default())?;
//!
//! let mut client = pool.get_client()?;
//! client.write_message_start("GET / HTTP/1.1")?;
//! client.write_header("Host", "localhost")?;
//! client.send()?;
//! println!("{:?}: {} bytes", client.status(), client.body().len());
//! // Dropping `client` returns it to the pool.
//! # Ok(())
//! # }
//! ```

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_queue::ArrayQueue;

use crate::client::Client;
use crate::config::Config;
use crate::endpoint::Endpoints;
use crate::error::Error;
use crate::metrics;
use crate::transport::{TcpTransport, Transport, TransportFactory};

struct PoolInner<T: Transport> {
    available: ArrayQueue<Client<T>>,
    size: usize,
    leased: AtomicUsize,
    closed: AtomicBool,
}

impl<T: Transport> PoolInner<T> {
    fn return_client(&self, mut client: Client<T>) {
        client.recycle();
        self.leased.fetch_sub(1, Ordering::Relaxed);
        if self.closed.load(Ordering::Acquire) {
            client.close();
            return;
        }
        // Capacity covers every client ever built.
        if let Err(mut client) = self.available.push(client) {
            client.close();
            return;
        }
        // `close` may have drained the queue between the check above and
        // the push.
        if self.closed.load(Ordering::Acquire) {
            self.drain();
        }
    }

    fn drain(&self) -> usize {
        let mut drained = 0;
        while let Some(mut client) = self.available.pop() {
            client.close();
            drained += 1;
        }
        drained
    }
}

/// A pool of `pool_size` clients sharing one endpoint source.
pub struct Pool<T: Transport = TcpTransport> {
    inner: Arc<PoolInner<T>>,
}

impl Pool<TcpTransport> {
    /// Build a pool of TCP clients.
    pub fn new(endpoints: impl Endpoints + 'static, config: Config) -> Result<Self, Error> {
        let options = config.transport_options();
        Self::with_transport(
            endpoints,
            config,
            Arc::new(move || TcpTransport::new(options)),
        )
    }
}

impl<T: Transport> Pool<T> {
    /// Build a pool whose clients use transports from `factory`.
    pub fn with_transport(
        endpoints: impl Endpoints + 'static,
        config: Config,
        factory: TransportFactory<T>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let endpoints: Arc<dyn Endpoints> = Arc::new(endpoints);
        let available = ArrayQueue::new(config.pool_size);
        for _ in 0..config.pool_size {
            let client = Client::new(endpoints.clone(), &config, factory.clone())?;
            if available.push(client).is_err() {
                return Err(Error::InvalidConfiguration(
                    "pool queue smaller than pool_size".into(),
                ));
            }
        }

        tracing::debug!(size = config.pool_size, "pool built");
        Ok(Self {
            inner: Arc::new(PoolInner {
                available,
                size: config.pool_size,
                leased: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Lease a client, or fail immediately if all are in use.
    pub fn get_client(&self) -> Result<PooledClient<T>, Error> {
        let client = if self.is_closed() {
            None
        } else {
            self.inner.available.pop()
        };
        match client {
            Some(client) => {
                self.inner.leased.fetch_add(1, Ordering::Relaxed);
                metrics::LEASED.increment();
                Ok(PooledClient {
                    client: ManuallyDrop::new(client),
                    pool: Arc::downgrade(&self.inner),
                })
            }
            None => {
                metrics::POOL_EXHAUSTED.increment();
                tracing::trace!(size = self.inner.size, "pool exhausted");
                Err(Error::PoolExhausted)
            }
        }
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Clients ready to be leased.
    pub fn available(&self) -> usize {
        self.inner.available.len()
    }

    pub fn leased(&self) -> usize {
        self.inner.leased.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Close every idle client. Clients still leased are closed when they
    /// are returned. Further leases fail with [`Error::PoolExhausted`].
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let drained = self.inner.drain();
        tracing::debug!(drained, leased = self.leased(), "pool closed");
    }
}

impl<T: Transport> Drop for Pool<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// A leased [`Client`]. Dropping it recycles the client and returns it to
/// its pool.
pub struct PooledClient<T: Transport = TcpTransport> {
    client: ManuallyDrop<Client<T>>,
    pool: Weak<PoolInner<T>>,
}

impl<T: Transport> Deref for PooledClient<T> {
    type Target = Client<T>;

    fn deref(&self) -> &Client<T> {
        &self.client
    }
}

impl<T: Transport> DerefMut for PooledClient<T> {
    fn deref_mut(&mut self) -> &mut Client<T> {
        &mut self.client
    }
}

impl<T: Transport> Drop for PooledClient<T> {
    fn drop(&mut self) {
        // SAFETY: Drop runs once and `client` is not used afterwards.
        let client = unsafe { ManuallyDrop::take(&mut self.client) };
        metrics::LEASED.decrement();
        match self.pool.upgrade() {
            Some(pool) => pool.return_client(client),
            None => drop(client),
        }
    }
}
