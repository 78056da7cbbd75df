//! http-reactor metrics.
//!
//! Process-wide counters for exchanges, connection churn, and pool
//! admission. Exposed through any `metriken` exporter.

use metriken::{Counter, Gauge, metric};

// ── Exchanges ───────────────────────────────────────────────────────

#[metric(
    name = "reactor/exchanges",
    description = "Request/response exchanges completed successfully"
)]
pub static EXCHANGES: Counter = Counter::new();

#[metric(
    name = "reactor/exchanges/errors",
    description = "Exchanges that returned an error"
)]
pub static EXCHANGE_ERRORS: Counter = Counter::new();

#[metric(
    name = "reactor/exchanges/timeouts",
    description = "Exchanges that ran out of time budget"
)]
pub static TIMEOUTS: Counter = Counter::new();

// ── Connection lifecycle ────────────────────────────────────────────

#[metric(
    name = "reactor/connections/connects",
    description = "Successful transport connects"
)]
pub static CONNECTS: Counter = Counter::new();

#[metric(
    name = "reactor/connections/connect_errors",
    description = "Failed transport connects"
)]
pub static CONNECT_ERRORS: Counter = Counter::new();

#[metric(
    name = "reactor/connections/faults",
    description = "Clients moved to the faulted state"
)]
pub static FAULTS: Counter = Counter::new();

#[metric(
    name = "reactor/connections/rebuilds",
    description = "Transports torn down and rebuilt"
)]
pub static REBUILDS: Counter = Counter::new();

#[metric(
    name = "reactor/connections/expired",
    description = "Connections rebuilt because they outlived the expiry"
)]
pub static EXPIRED: Counter = Counter::new();

// ── Bytes ───────────────────────────────────────────────────────────

#[metric(name = "reactor/bytes/sent", description = "Request bytes sent")]
pub static BYTES_SENT: Counter = Counter::new();

#[metric(
    name = "reactor/bytes/received",
    description = "Response bytes received"
)]
pub static BYTES_RECEIVED: Counter = Counter::new();

// ── Pool ────────────────────────────────────────────────────────────

#[metric(
    name = "reactor/pool/leased",
    description = "Clients currently leased from a pool"
)]
pub static LEASED: Gauge = Gauge::new();

#[metric(
    name = "reactor/pool/exhausted",
    description = "Lease attempts rejected because no client was available"
)]
pub static POOL_EXHAUSTED: Counter = Counter::new();
