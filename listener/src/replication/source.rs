use std::future::Future;

use bytes::Bytes;
use tokio_postgres::types::PgLsn;

use crate::error::ListenerResult;

/// A protocol event received from the replication connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationEvent {
    /// Keepalive carrying the current end of the server's WAL.
    Heartbeat { server_position: PgLsn },
    /// A chunk of output plugin data.
    Data {
        bytes: Bytes,
        start_position: PgLsn,
        end_position: PgLsn,
    },
}

/// Source of replication events driven by [`crate::replication::session::ReplicationSession`].
pub trait ReplicationSource {
    /// Waits for the next event.
    ///
    /// An error means the connection can no longer be used.
    fn next_event(&mut self) -> impl Future<Output = ListenerResult<ReplicationEvent>> + Send;

    /// Reports to the server that everything up to `position` has been processed.
    fn send_acknowledgment(
        &mut self,
        position: PgLsn,
    ) -> impl Future<Output = ListenerResult<()>> + Send;
}
