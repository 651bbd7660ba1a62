use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::conversions::event::OutboundEvent;
use crate::error::{ErrorKind, ListenerResult};
use crate::listener_error;
use crate::publisher::base::EventPublisher;
use crate::publisher::memory::MemoryPublisher;

/// Publisher failing a fixed number of times before storing events in memory.
#[derive(Debug, Clone)]
pub struct FlakyPublisher {
    failures_left: Arc<AtomicU64>,
    attempts: Arc<AtomicU64>,
    inner: MemoryPublisher,
}

impl FlakyPublisher {
    /// Creates a publisher whose first `failures` publishes fail.
    pub fn new(failures: u64) -> Self {
        Self {
            failures_left: Arc::new(AtomicU64::new(failures)),
            attempts: Arc::new(AtomicU64::new(0)),
            inner: MemoryPublisher::new(),
        }
    }

    /// Number of publish calls, failed ones included.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Events that were published successfully.
    pub async fn events(&self) -> Vec<OutboundEvent> {
        self.inner.events().await
    }
}

impl EventPublisher for FlakyPublisher {
    async fn publish(&self, topic: &str, value: &str) -> ListenerResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(listener_error!(
                ErrorKind::PublishFailed,
                "Broker unavailable",
                format!("topic '{topic}'")
            ));
        }

        self.inner.publish(topic, value).await
    }
}
