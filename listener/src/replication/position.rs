use tokio_postgres::types::PgLsn;
use tracing::debug;

/// Tracks the replication position reported back to the server.
///
/// The position only moves forward. It is advanced on every keepalive and on every data message
/// once its payload has been handed off.
#[derive(Debug, Clone, Copy)]
pub struct PositionTracker {
    position: PgLsn,
}

impl PositionTracker {
    pub fn new(start: PgLsn) -> Self {
        Self { position: start }
    }

    /// Records `position` as the latest observed position.
    ///
    /// Returns `false` and keeps the current value when `position` is behind it.
    pub fn observe(&mut self, position: PgLsn) -> bool {
        if position < self.position {
            debug!(
                current = %self.position,
                observed = %position,
                "ignoring replication position behind the tracked one"
            );
            return false;
        }

        self.position = position;
        true
    }

    /// Position to send in the next acknowledgment.
    pub fn acknowledgment(&self) -> PgLsn {
        self.position
    }
}
