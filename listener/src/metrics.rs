use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{Unit, counter, describe_counter, describe_gauge, gauge};
use tokio_postgres::types::PgLsn;

static REGISTER_METRICS: Once = Once::new();

pub const PG_LISTENER_PROCESSED_MESSAGES_TOTAL: &str = "pg_listener_processed_messages_total";
pub const PG_LISTENER_RECEIVED_HEARTBEATS_TOTAL: &str = "pg_listener_received_heartbeats_total";
pub const PG_LISTENER_LOGGED_ERRORS_TOTAL: &str = "pg_listener_logged_errors_total";
pub const PG_LISTENER_RAW_BUFFER_BYTES: &str = "pg_listener_raw_buffer_bytes";
pub const PG_LISTENER_LAST_COMMITTED_WAL_LOCATION: &str = "pg_listener_last_committed_wal_location";

/// Registers the descriptions of the metrics emitted by the listener.
///
/// Safe to call multiple times, the descriptions are registered only once.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            PG_LISTENER_PROCESSED_MESSAGES_TOTAL,
            Unit::Count,
            "Total number of events published to the message bus"
        );

        describe_counter!(
            PG_LISTENER_RECEIVED_HEARTBEATS_TOTAL,
            Unit::Count,
            "Total number of keepalive messages received from the server"
        );

        describe_counter!(
            PG_LISTENER_LOGGED_ERRORS_TOTAL,
            Unit::Count,
            "Total number of recoverable errors logged by the listener"
        );

        describe_gauge!(
            PG_LISTENER_RAW_BUFFER_BYTES,
            Unit::Bytes,
            "Number of bytes held by the payload reassembly buffer"
        );

        describe_gauge!(
            PG_LISTENER_LAST_COMMITTED_WAL_LOCATION,
            "Last WAL position acknowledged to the server"
        );
    });
}

/// Point-in-time copy of [`SessionMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub messages_total: u64,
    pub heartbeats_total: u64,
    pub errors_total: u64,
    pub buffer_size: u64,
    pub last_acked_position: u64,
}

/// Counters and gauges of a replication session.
///
/// Values are kept locally so they can be inspected with [`SessionMetrics::snapshot`] and are
/// mirrored to the global `metrics` recorder on every update.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    messages_total: AtomicU64,
    heartbeats_total: AtomicU64,
    errors_total: AtomicU64,
    buffer_size: AtomicU64,
    last_acked_position: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event successfully published.
    pub fn record_message(&self) {
        self.messages_total.fetch_add(1, Ordering::Relaxed);
        counter!(PG_LISTENER_PROCESSED_MESSAGES_TOTAL).increment(1);
    }

    /// Records a keepalive received from the server.
    pub fn record_heartbeat(&self) {
        self.heartbeats_total.fetch_add(1, Ordering::Relaxed);
        counter!(PG_LISTENER_RECEIVED_HEARTBEATS_TOTAL).increment(1);
    }

    /// Records a recoverable error.
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
        counter!(PG_LISTENER_LOGGED_ERRORS_TOTAL).increment(1);
    }

    pub fn set_buffer_size(&self, size: usize) {
        self.buffer_size.store(size as u64, Ordering::Relaxed);
        gauge!(PG_LISTENER_RAW_BUFFER_BYTES).set(size as f64);
    }

    pub fn set_last_acked_position(&self, position: PgLsn) {
        let position = u64::from(position);
        self.last_acked_position.store(position, Ordering::Relaxed);
        gauge!(PG_LISTENER_LAST_COMMITTED_WAL_LOCATION).set(position as f64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_total: self.messages_total.load(Ordering::Relaxed),
            heartbeats_total: self.heartbeats_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            buffer_size: self.buffer_size.load(Ordering::Relaxed),
            last_acked_position: self.last_acked_position.load(Ordering::Relaxed),
        }
    }
}
