use std::borrow::Cow;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::error::{ErrorKind, ListenerResult};
use crate::listener_error;
use crate::publisher::base::EventPublisher;

/// Leader-only acknowledgment, the broker does not wait for replicas.
const ACKS: &str = "1";
/// Retries performed by the producer itself before a publish is reported as failed.
const PRODUCER_RETRIES: &str = "5";

/// Publisher writing events to Kafka.
///
/// Each publish waits for the delivery report of its message, so a successful return means the
/// partition leader stored it.
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic_suffix: Option<String>,
    message_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(
        brokers: &[String],
        topic_suffix: Option<String>,
        message_timeout_ms: u64,
    ) -> ListenerResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers.join(","))
            .set("acks", ACKS)
            .set("retries", PRODUCER_RETRIES)
            .set("message.timeout.ms", message_timeout_ms.to_string())
            .create()
            .map_err(|e| {
                listener_error!(
                    ErrorKind::PublisherConnectionFailed,
                    "Failed to create Kafka producer",
                    e
                )
            })?;

        info!(brokers = %brokers.join(","), "kafka producer created");

        Ok(Self {
            producer,
            topic_suffix: topic_suffix.filter(|suffix| !suffix.is_empty()),
            message_timeout: Duration::from_millis(message_timeout_ms),
        })
    }

    /// Waits for queued messages to be delivered.
    pub fn flush(&self, timeout: Duration) -> ListenerResult<()> {
        self.producer.flush(Timeout::After(timeout)).map_err(|e| {
            listener_error!(
                ErrorKind::PublishFailed,
                "Failed to flush Kafka producer",
                e
            )
        })
    }

    fn topic_name<'a>(&self, topic: &'a str) -> Cow<'a, str> {
        match &self.topic_suffix {
            Some(suffix) => Cow::Owned(format!("{topic}{suffix}")),
            None => Cow::Borrowed(topic),
        }
    }
}

impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, value: &str) -> ListenerResult<()> {
        let topic = self.topic_name(topic);
        let record: FutureRecord<'_, (), str> = FutureRecord::to(&topic).payload(value);

        self.producer
            .send(record, Timeout::After(self.message_timeout))
            .await
            .map_err(|(err, _)| {
                listener_error!(
                    ErrorKind::PublishFailed,
                    "Failed to publish event to Kafka",
                    format!("topic '{topic}': {err}")
                )
            })?;

        debug!(%topic, "event delivered to kafka");

        Ok(())
    }
}
