use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::conversions::event::OutboundEvent;
use crate::error::ListenerResult;
use crate::publisher::base::EventPublisher;

/// Publisher keeping every event in memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    events: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events published so far, in publish order.
    pub async fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().await.clone()
    }
}

impl EventPublisher for MemoryPublisher {
    async fn publish(&self, topic: &str, value: &str) -> ListenerResult<()> {
        info!(topic, value, "publishing event");
        self.events
            .lock()
            .await
            .push(OutboundEvent::new(topic, value));

        Ok(())
    }
}
