use serde::Deserialize;

const DEFAULT_TOPIC_COLUMN: &str = "topic";
const DEFAULT_PAYLOAD_COLUMN: &str = "payload";

/// Names of the columns an inserted row must carry to be forwarded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExtractionConfig {
    /// Column whose value names the destination topic.
    #[serde(default = "default_topic_column")]
    pub topic_column: String,
    /// Column whose value becomes the published message.
    #[serde(default = "default_payload_column")]
    pub payload_column: String,
}

fn default_topic_column() -> String {
    DEFAULT_TOPIC_COLUMN.to_owned()
}

fn default_payload_column() -> String {
    DEFAULT_PAYLOAD_COLUMN.to_owned()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            topic_column: default_topic_column(),
            payload_column: default_payload_column(),
        }
    }
}
