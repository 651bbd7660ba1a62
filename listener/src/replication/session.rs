use std::sync::Arc;

use tokio_postgres::types::PgLsn;
use tracing::{debug, error, info};

use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::conversions::extract::ChangeExtractor;
use crate::conversions::reassembler::PayloadReassembler;
use crate::delivery::DeliveryCoordinator;
use crate::error::{ErrorKind, ListenerResult};
use crate::listener_error;
use crate::metrics::SessionMetrics;
use crate::publisher::base::EventPublisher;
use crate::replication::position::PositionTracker;
use crate::replication::source::{ReplicationEvent, ReplicationSource};

/// Drives a started replication stream until it fails or a shutdown is requested.
///
/// Events are handled one at a time: a data message is decoded, its events are delivered and the
/// message is acknowledged before the next event is read from the source.
pub struct ReplicationSession<S, P> {
    source: S,
    tracker: PositionTracker,
    reassembler: PayloadReassembler,
    extractor: ChangeExtractor,
    delivery: DeliveryCoordinator<P>,
    metrics: Arc<SessionMetrics>,
    shutdown_rx: ShutdownRx,
}

impl<S, P> ReplicationSession<S, P>
where
    S: ReplicationSource,
    P: EventPublisher,
{
    pub fn new(
        source: S,
        start_lsn: PgLsn,
        extractor: ChangeExtractor,
        delivery: DeliveryCoordinator<P>,
        metrics: Arc<SessionMetrics>,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            source,
            tracker: PositionTracker::new(start_lsn),
            reassembler: PayloadReassembler::new(),
            extractor,
            delivery,
            metrics,
            shutdown_rx,
        }
    }

    /// Runs the session loop.
    ///
    /// Returns `Ok(())` only after a shutdown request. Any error is fatal for the session.
    pub async fn run(mut self) -> ListenerResult<()> {
        info!(start_lsn = %self.tracker.acknowledgment(), "replication session started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    info!("shutting down replication session");

                    return Ok(());
                }
                event = self.source.next_event() => {
                    let event = event?;

                    if self.handle_event(event).await?.should_shutdown() {
                        info!("replication session stopped while delivering events");

                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle_event(
        &mut self,
        event: ReplicationEvent,
    ) -> ListenerResult<ShutdownResult<(), ()>> {
        match event {
            ReplicationEvent::Heartbeat { server_position } => {
                self.handle_heartbeat(server_position).await;

                Ok(ShutdownResult::Ok(()))
            }
            ReplicationEvent::Data {
                bytes,
                start_position,
                end_position,
            } => {
                debug!(
                    %start_position,
                    %end_position,
                    size = bytes.len(),
                    "received data message"
                );

                self.handle_data(&bytes, start_position).await
            }
        }
    }

    async fn handle_heartbeat(&mut self, server_position: PgLsn) {
        self.metrics.record_heartbeat();
        self.tracker.observe(server_position);

        let position = self.tracker.acknowledgment();
        match self.source.send_acknowledgment(position).await {
            Ok(()) => {
                self.metrics.set_last_acked_position(position);
                debug!(%position, "heartbeat acknowledged");
            }
            Err(err) => {
                // Keepalives carry no data, the next one retries the acknowledgment.
                self.metrics.record_error();
                error!(%position, error = %err, "failed to acknowledge heartbeat");
            }
        }
    }

    /// A heartbeat received between two chunks of one payload may already have moved the tracker
    /// past `start_position`, in which case the chunk is acknowledged at the heartbeat position.
    async fn handle_data(
        &mut self,
        bytes: &[u8],
        start_position: PgLsn,
    ) -> ListenerResult<ShutdownResult<(), ()>> {
        self.tracker.observe(start_position);

        let change_set = self.reassembler.accept(bytes);
        self.metrics.set_buffer_size(self.reassembler.buffered_len());

        if let Some(change_set) = change_set? {
            let events = self.extractor.extract(&change_set)?;
            debug!(
                records = change_set.len(),
                events = events.len(),
                "payload decoded"
            );

            for event in &events {
                if let ShutdownResult::Shutdown(()) =
                    self.delivery.deliver(event, &mut self.shutdown_rx).await
                {
                    return Ok(ShutdownResult::Shutdown(()));
                }
            }
        }

        let position = self.tracker.acknowledgment();
        if let Err(err) = self.source.send_acknowledgment(position).await {
            error!(%position, error = %err, "failed to acknowledge data message");

            return Err(listener_error!(
                ErrorKind::AcknowledgmentFailed,
                "Failed to acknowledge data message",
                err
            ));
        }
        self.metrics.set_last_acked_position(position);

        Ok(ShutdownResult::Ok(()))
    }
}
