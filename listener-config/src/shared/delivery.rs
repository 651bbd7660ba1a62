use serde::Deserialize;
use std::time::Duration;

const DEFAULT_RETRY_DELAY_MS: u64 = 3_000;

/// Retry behaviour of the delivery of events to the publisher.
///
/// Failed publishes are retried forever, waiting [`DeliveryConfig::retry_delay_ms`] between two
/// attempts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeliveryConfig {
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl DeliveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}
