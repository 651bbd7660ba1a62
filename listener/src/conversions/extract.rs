use listener_config::shared::ExtractionConfig;
use serde_json::Value;
use tracing::trace;

use crate::conversions::ColumnValue;
use crate::conversions::change::{ChangeRecord, ChangeSet};
use crate::conversions::event::OutboundEvent;
use crate::error::ListenerResult;

/// Projects inserted rows into [`OutboundEvent`]s using a topic column and a payload column.
#[derive(Debug, Clone)]
pub struct ChangeExtractor {
    topic_column: String,
    payload_column: String,
}

impl ChangeExtractor {
    pub fn new(topic_column: impl Into<String>, payload_column: impl Into<String>) -> Self {
        Self {
            topic_column: topic_column.into(),
            payload_column: payload_column.into(),
        }
    }

    /// Returns one event per inserted record holding both columns, in record order.
    ///
    /// Records of any other kind and inserts missing either column are skipped. A topic or
    /// payload value that is not a number, a string or a null fails with
    /// [`crate::error::ErrorKind::InvalidData`].
    pub fn extract(&self, change_set: &ChangeSet) -> ListenerResult<Vec<OutboundEvent>> {
        let mut events = Vec::new();

        for record in change_set.records.iter().filter(|record| record.is_insert()) {
            if let Some(event) = self.extract_record(record)? {
                events.push(event);
            }
        }

        Ok(events)
    }

    fn extract_record(&self, record: &ChangeRecord) -> ListenerResult<Option<OutboundEvent>> {
        let mut topic: Option<&Value> = None;
        let mut payload: Option<&Value> = None;

        // Later columns override earlier ones with the same name.
        for column in &record.columns {
            if column.name == self.topic_column {
                topic = Some(&column.value);
            }
            if column.name == self.payload_column {
                payload = Some(&column.value);
            }
        }

        let (Some(topic), Some(payload)) = (topic, payload) else {
            trace!(
                schema = %record.schema,
                table = %record.table,
                "skipping insert without topic and payload columns"
            );
            return Ok(None);
        };

        let topic = ColumnValue::from_json(&self.topic_column, topic)?;
        let payload = ColumnValue::from_json(&self.payload_column, payload)?;

        Ok(Some(OutboundEvent::new(topic.render(), payload.render())))
    }
}

impl Default for ChangeExtractor {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for ChangeExtractor {
    fn from(config: &ExtractionConfig) -> Self {
        Self::new(config.topic_column.clone(), config.payload_column.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversions::reassembler::PayloadReassembler;
    use crate::error::ErrorKind;

    fn decode(payload: &str) -> ChangeSet {
        PayloadReassembler::new()
            .accept(payload.as_bytes())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn insert_with_topic_and_payload_yields_an_event() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["id","topic","payload"],"columnvalues":[3,"demo_topic","{\"id\":\"file\"}"]}]}"#,
        );

        let events = ChangeExtractor::default().extract(&change_set).unwrap();

        assert_eq!(
            events,
            vec![OutboundEvent::new("demo_topic", "{\"id\":\"file\"}")]
        );
    }

    #[test]
    fn update_is_skipped() {
        let change_set = decode(
            r#"{"change":[{"kind":"update","columnnames":["id","topic","payload"],"columnvalues":[3,"demo_topic","{\"id\":\"file\"}"]}]}"#,
        );

        assert!(ChangeExtractor::default().extract(&change_set).unwrap().is_empty());
    }

    #[test]
    fn insert_without_payload_column_is_skipped() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["id","topic","body"],"columnvalues":[3,"demo_topic","x"]}]}"#,
        );

        assert!(ChangeExtractor::default().extract(&change_set).unwrap().is_empty());
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["Topic","payload"],"columnvalues":["t","v"]}]}"#,
        );

        assert!(ChangeExtractor::default().extract(&change_set).unwrap().is_empty());
    }

    #[test]
    fn values_are_rendered() {
        let change_set = decode(
            r#"{"change":[
                {"kind":"insert","columnnames":["topic","payload"],"columnvalues":["",null]},
                {"kind":"insert","columnnames":["topic","payload"],"columnvalues":[42,1.5]}
            ]}"#,
        );

        let events = ChangeExtractor::default().extract(&change_set).unwrap();

        assert_eq!(
            events,
            vec![OutboundEvent::new("", "null"), OutboundEvent::new("42", "1.5")]
        );
    }

    #[test]
    fn order_is_preserved_and_non_inserts_are_excluded() {
        let change_set = decode(
            r#"{"change":[
                {"kind":"insert","columnnames":["topic","payload"],"columnvalues":["t","1"]},
                {"kind":"delete","oldkeys":{"keynames":["id"],"keyvalues":[1]}},
                {"kind":"insert","columnnames":["topic","payload"],"columnvalues":["t","2"]},
                {"kind":"update","columnnames":["topic","payload"],"columnvalues":["t","x"]},
                {"kind":"insert","columnnames":["payload","topic"],"columnvalues":["3","t"]}
            ]}"#,
        );

        let events = ChangeExtractor::default().extract(&change_set).unwrap();
        let inserts = change_set.records.iter().filter(|r| r.is_insert()).count();

        assert!(events.len() <= inserts);
        let values: Vec<_> = events.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn last_duplicate_column_wins() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["topic","payload","topic"],"columnvalues":["first","v","second"]}]}"#,
        );

        let events = ChangeExtractor::default().extract(&change_set).unwrap();

        assert_eq!(events, vec![OutboundEvent::new("second", "v")]);
    }

    #[test]
    fn custom_column_names_are_used() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["destination","body","topic"],"columnvalues":["orders","{}","ignored"]}]}"#,
        );

        let events = ChangeExtractor::new("destination", "body").extract(&change_set).unwrap();

        assert_eq!(events, vec![OutboundEvent::new("orders", "{}")]);
    }

    #[test]
    fn boolean_columns_outside_projected_inserts_are_ignored() {
        let change_set = decode(
            r#"{"change":[
                {"kind":"update","columnnames":["id","active"],"columnvalues":[1,true]},
                {"kind":"delete","oldkeys":{"keynames":["id","active"],"keyvalues":[1,false]}},
                {"kind":"insert","columnnames":["id","active","topic","payload"],"columnvalues":[2,true,"orders","{}"]}
            ]}"#,
        );

        let events = ChangeExtractor::default().extract(&change_set).unwrap();

        assert_eq!(events, vec![OutboundEvent::new("orders", "{}")]);
    }

    #[test]
    fn unsupported_projected_value_is_an_error() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["topic","payload"],"columnvalues":["t",[1,2]]}]}"#,
        );

        let err = ChangeExtractor::default().extract(&change_set).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn numeric_payloads_round_trip() {
        let change_set = decode(
            r#"{"change":[{"kind":"insert","columnnames":["topic","payload"],"columnvalues":["t",0.30000000000000004]}]}"#,
        );

        let events = ChangeExtractor::default().extract(&change_set).unwrap();
        let parsed: f64 = events[0].value.parse().unwrap();

        assert_eq!(parsed, 0.30000000000000004);
    }
}
