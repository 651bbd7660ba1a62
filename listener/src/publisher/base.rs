use std::future::Future;

use crate::error::ListenerResult;

/// Sink of outbound events.
///
/// A publish call either hands the value off to the sink or fails. Implementations must not retry
/// on their own, retries are driven by [`crate::delivery::DeliveryCoordinator`].
pub trait EventPublisher {
    fn publish(&self, topic: &str, value: &str) -> impl Future<Output = ListenerResult<()>> + Send;
}
