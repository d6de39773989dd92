//! Validation of user-supplied queue message attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Attribute name to typed value, exactly as the user supplied it.
pub type MessageAttributes = Map<String, Value>;

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("message attributes are not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message attributes must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
    #[error("message attribute `{name}` is invalid: {reason}")]
    InvalidEntry { name: String, reason: String },
}

/// Typed value of a single queue message attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TypedAttribute {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<String>,
}

/// Parses the raw `--attributes` argument.
///
/// Absent or empty input yields an empty mapping. Anything else must be a
/// JSON object; scalars and arrays are rejected rather than coerced.
pub fn parse_message_attributes(raw: Option<&str>) -> Result<MessageAttributes, AttributeError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(MessageAttributes::new()),
    };

    match serde_json::from_str::<Value>(raw)? {
        Value::Object(attributes) => Ok(attributes),
        other => Err(AttributeError::NotAnObject {
            kind: value_kind(&other),
        }),
    }
}

/// Converts validated attributes into their typed form.
pub fn typed_attributes(
    attributes: &MessageAttributes,
) -> Result<BTreeMap<String, TypedAttribute>, AttributeError> {
    let mut typed = BTreeMap::new();
    for (name, value) in attributes {
        let attribute = TypedAttribute::deserialize(value).map_err(|error| {
            AttributeError::InvalidEntry {
                name: name.clone(),
                reason: error.to_string(),
            }
        })?;
        if attribute.string_value.is_none() && attribute.binary_value.is_none() {
            return Err(AttributeError::InvalidEntry {
                name: name.clone(),
                reason: "either StringValue or BinaryValue is required".to_string(),
            });
        }
        typed.insert(name.clone(), attribute);
    }
    Ok(typed)
}

/// Worked example printed whenever a publish attempt is rejected.
pub fn example_payload() -> Value {
    json!({
        "message": "Hello World!",
        "subject": "Hello World!",
        "message_attributes": {"Author": {"StringValue": "Daniel", "DataType": "String"}},
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_empty_input_is_an_empty_mapping() {
        assert!(parse_message_attributes(None).expect("none").is_empty());
        assert!(parse_message_attributes(Some("")).expect("empty").is_empty());
    }

    #[test]
    fn rejects_scalars_and_sequences() {
        for raw in ["5", "[1,2]", "\"text\"", "null"] {
            let error = parse_message_attributes(Some(raw)).expect_err("non-object should fail");
            assert!(matches!(error, AttributeError::NotAnObject { .. }), "{raw}");
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let error =
            parse_message_attributes(Some("not a json object")).expect_err("garbage should fail");
        assert!(matches!(error, AttributeError::Malformed(_)));
    }

    #[test]
    fn accepts_typed_mapping() {
        let attributes = parse_message_attributes(Some(
            r#"{"Author":{"StringValue":"Daniel","DataType":"String"}}"#,
        ))
        .expect("mapping should parse");

        let typed = typed_attributes(&attributes).expect("typed");
        assert_eq!(
            typed["Author"],
            TypedAttribute {
                data_type: "String".to_string(),
                string_value: Some("Daniel".to_string()),
                binary_value: None,
            }
        );
    }

    #[test]
    fn typed_conversion_rejects_untyped_values() {
        let attributes = parse_message_attributes(Some(r#"{"k":"v"}"#)).expect("mapping");
        let error = typed_attributes(&attributes).expect_err("bare string should fail");
        assert!(matches!(error, AttributeError::InvalidEntry { ref name, .. } if name == "k"));

        let attributes =
            parse_message_attributes(Some(r#"{"k":{"DataType":"String"}}"#)).expect("mapping");
        assert!(typed_attributes(&attributes).is_err());
    }

    #[test]
    fn example_payload_carries_valid_attributes() {
        let example = example_payload();
        let attributes = example["message_attributes"]
            .as_object()
            .expect("example attributes should be an object");
        assert!(typed_attributes(attributes).is_ok());
    }
}
