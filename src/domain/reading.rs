// Telemetry reading domain model
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One telemetry sample: a timestamp and a field -> value payload.
///
/// Readings are immutable once decoded; every poll replaces the previous
/// sequence wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Reading {
    pub fn new(timestamp: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            timestamp: timestamp.into(),
            data,
        }
    }

    /// Decode one response element.
    ///
    /// The endpoint normally returns `{timestamp, data}` objects, but older
    /// device firmware posts flattened payloads where the fields sit next to
    /// the timestamp. In that case everything except `timestamp` is the
    /// payload. Elements that are not objects decode to an empty reading.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::default();
        };

        let timestamp = fields
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let data = match fields.get("data") {
            Some(Value::Object(map)) => map.clone(),
            Some(_) => Map::new(),
            None => {
                let mut map = fields.clone();
                map.remove("timestamp");
                map
            }
        };

        Self { timestamp, data }
    }

    /// Decode a whole response body. `None` when the body is not an array;
    /// the caller treats that as nothing to render, not a failure.
    pub fn from_response(value: &Value) -> Option<Vec<Reading>> {
        value
            .as_array()
            .map(|items| items.iter().map(Reading::from_value).collect())
    }
}
