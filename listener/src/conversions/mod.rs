//! Decoding of wal2json payloads and their projection into outbound events.

use std::fmt;

use serde_json::Value;

use crate::bail;
use crate::error::{ErrorKind, ListenerResult};

pub mod change;
pub mod event;
pub mod extract;
pub mod reassembler;

/// Value of a column projected into an outbound event.
///
/// Only numbers, strings and nulls can be published, see [`ColumnValue::from_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Number(serde_json::Number),
    String(String),
    Null,
}

impl ColumnValue {
    /// Narrows the raw value of `column` to one that can be rendered.
    ///
    /// Booleans, arrays and objects fail with [`ErrorKind::InvalidData`].
    pub fn from_json(column: &str, value: &Value) -> ListenerResult<ColumnValue> {
        match value {
            Value::Number(number) => Ok(ColumnValue::Number(number.clone())),
            Value::String(string) => Ok(ColumnValue::String(string.clone())),
            Value::Null => Ok(ColumnValue::Null),
            other @ (Value::Bool(_) | Value::Array(_) | Value::Object(_)) => {
                bail!(
                    ErrorKind::InvalidData,
                    "Column value has an unsupported type",
                    format!("column '{column}' holds {other}")
                );
            }
        }
    }

    /// Renders the value as the string handed to the publisher.
    ///
    /// Integers keep their full precision and floats use the shortest decimal form that parses
    /// back to the same value, without exponent notation. Nulls render as `null`.
    pub fn render(&self) -> String {
        match self {
            ColumnValue::Number(number) => {
                if let Some(value) = number.as_i64() {
                    value.to_string()
                } else if let Some(value) = number.as_u64() {
                    value.to_string()
                } else {
                    // `serde_json::Number` always holds one of i64, u64 or f64.
                    let value = number.as_f64().unwrap_or_default();
                    format!("{value}")
                }
            }
            ColumnValue::String(value) => value.clone(),
            ColumnValue::Null => "null".to_owned(),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn number(raw: &str) -> ColumnValue {
        match serde_json::from_str::<Value>(raw).unwrap() {
            Value::Number(n) => ColumnValue::Number(n),
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn scalars_are_narrowed() {
        assert_eq!(
            ColumnValue::from_json("topic", &json!("orders")).unwrap(),
            ColumnValue::String("orders".to_owned())
        );
        assert_eq!(ColumnValue::from_json("payload", &json!(7)).unwrap().render(), "7");
        assert_eq!(ColumnValue::from_json("payload", &Value::Null).unwrap(), ColumnValue::Null);
    }

    #[test]
    fn other_shapes_are_rejected() {
        for value in [json!(true), json!([1, 2]), json!({"a": 1})] {
            let err = ColumnValue::from_json("payload", &value).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::InvalidData);
            assert!(err.detail().unwrap().contains("'payload'"));
        }
    }

    #[test]
    fn integers_keep_their_precision() {
        assert_eq!(number("3").render(), "3");
        assert_eq!(number("-42").render(), "-42");
        assert_eq!(number("9223372036854775807").render(), "9223372036854775807");
        assert_eq!(number("18446744073709551615").render(), "18446744073709551615");
    }

    #[test]
    fn floats_render_without_exponent() {
        assert_eq!(number("1.5").render(), "1.5");
        assert_eq!(number("2.0").render(), "2");
        assert_eq!(number("1e21").render(), "1000000000000000000000");
        assert_eq!(number("1.25e-7").render(), "0.000000125");
    }

    #[test]
    fn rendered_numbers_parse_back_to_the_same_value() {
        for raw in ["0", "17", "-3", "0.1", "3.141592653589793", "1e300", "-2.5e-12", "123456.789"] {
            let value = number(raw);
            let rendered = value.render();

            assert!(!rendered.contains('e'), "{rendered} uses exponent notation");
            let parsed: f64 = rendered.parse().unwrap();
            let original: f64 = raw.parse().unwrap();
            assert_eq!(parsed, original, "{raw} rendered as {rendered}");
        }
    }

    #[test]
    fn strings_and_nulls_render_verbatim() {
        assert_eq!(ColumnValue::String("{\"id\":1}".to_owned()).render(), "{\"id\":1}");
        assert_eq!(ColumnValue::String(String::new()).render(), "");
        assert_eq!(ColumnValue::Null.render(), "null");
        assert_eq!(ColumnValue::Null.to_string(), "null");
    }
}
