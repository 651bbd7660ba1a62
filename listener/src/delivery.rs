use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::conversions::event::OutboundEvent;
use crate::metrics::SessionMetrics;
use crate::publisher::base::EventPublisher;

/// Hands events to an [`EventPublisher`], retrying each one until it is published.
///
/// There is no retry limit: while the publisher keeps failing, the caller is blocked and no
/// further replication events are consumed.
#[derive(Debug)]
pub struct DeliveryCoordinator<P> {
    publisher: P,
    retry_delay: Duration,
    metrics: Arc<SessionMetrics>,
}

impl<P> DeliveryCoordinator<P>
where
    P: EventPublisher,
{
    pub fn new(publisher: P, retry_delay: Duration, metrics: Arc<SessionMetrics>) -> Self {
        Self {
            publisher,
            retry_delay,
            metrics,
        }
    }

    /// Publishes `event`, waiting `retry_delay` between failed attempts.
    ///
    /// Returns [`ShutdownResult::Shutdown`] when a shutdown is requested while waiting for the next
    /// attempt, in which case the event has not been published.
    pub async fn deliver(
        &self,
        event: &OutboundEvent,
        shutdown_rx: &mut ShutdownRx,
    ) -> ShutdownResult<(), ()> {
        let mut attempt: u64 = 1;

        loop {
            match self.publisher.publish(&event.topic, &event.value).await {
                Ok(()) => {
                    self.metrics.record_message();
                    debug!(topic = %event.topic, attempt, "event published");

                    return ShutdownResult::Ok(());
                }
                Err(err) => {
                    self.metrics.record_error();
                    error!(
                        topic = %event.topic,
                        attempt,
                        retry_delay_ms = self.retry_delay.as_millis() as u64,
                        error = %err,
                        "failed to publish event, retrying"
                    );
                }
            }

            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    info!(topic = %event.topic, "shutting down while retrying event delivery");

                    return ShutdownResult::Shutdown(());
                }
                _ = tokio::time::sleep(self.retry_delay) => {}
            }

            attempt += 1;
        }
    }
}
