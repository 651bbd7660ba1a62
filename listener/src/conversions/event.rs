/// Event handed to the publisher: a message body addressed to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
    pub topic: String,
    pub value: String,
}

impl OutboundEvent {
    pub fn new(topic: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
        }
    }
}
