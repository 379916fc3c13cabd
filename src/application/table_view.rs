// Readings table rows, most-recent-first
use chrono::{DateTime, Local};

use crate::domain::reading::Reading;

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub index: usize,
    pub time_label: String,
    pub payload: String,
}

/// Build display rows with the newest reading first. Each row carries a
/// 1-based position, the timestamp rendered in local time, and the payload
/// serialized as compact JSON.
pub fn table_rows(readings: &[Reading]) -> Vec<TableRow> {
    readings
        .iter()
        .rev()
        .enumerate()
        .map(|(i, reading)| TableRow {
            index: i + 1,
            time_label: local_time_label(&reading.timestamp),
            payload: serde_json::to_string(&reading.data).unwrap_or_default(),
        })
        .collect()
}

/// Local-time rendering of an RFC 3339 timestamp; anything unparseable is
/// shown verbatim.
fn local_time_label(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading(timestamp: &str, data: serde_json::Value) -> Reading {
        Reading::from_value(&json!({"timestamp": timestamp, "data": data}))
    }

    #[test]
    fn rows_are_most_recent_first() {
        let readings = vec![
            reading("2024-01-01T00:00:00Z", json!({"temp": 20})),
            reading("2024-01-01T00:00:03Z", json!({"temp": 21})),
        ];
        let rows = table_rows(&readings);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert!(rows[0].payload.contains("21"));
        assert!(rows[1].payload.contains("20"));
    }

    #[test]
    fn valid_timestamps_render_as_local_datetime() {
        let label = local_time_label("2024-01-01T00:00:03Z");
        // "YYYY-mm-dd HH:MM:SS" regardless of the local zone.
        assert_eq!(label.len(), 19);
        assert_eq!(label.as_bytes()[10], b' ');
    }

    #[test]
    fn unparseable_timestamp_is_shown_verbatim() {
        assert_eq!(local_time_label(""), "");
        assert_eq!(local_time_label("not-a-time"), "not-a-time");
    }

    #[test]
    fn payload_serializes_non_numeric_values_too() {
        let rows = table_rows(&[reading("t", json!({"status": "ok", "temp": 20}))]);
        assert!(rows[0].payload.contains("\"status\":\"ok\""));
    }
}
