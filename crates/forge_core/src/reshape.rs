//! Reshapes captured queue trigger events into a minimal, inspectable form.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReshapeError {
    #[error("trigger event is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("trigger event contains no records")]
    NoRecords,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEnvelope {
    #[serde(rename = "Records")]
    pub records: Vec<DeliveryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub body: String,
    #[serde(
        rename = "messageAttributes",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub message_attributes: Map<String, Value>,
}

/// Keeps the first record's body and attributes and drops every other
/// delivery field. The input event is left untouched.
pub fn reshape(event: &Value) -> Result<TriggerEnvelope, ReshapeError> {
    let envelope = TriggerEnvelope::deserialize(event)?;
    let record = envelope
        .records
        .into_iter()
        .next()
        .ok_or(ReshapeError::NoRecords)?;
    Ok(TriggerEnvelope {
        records: vec![record],
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
