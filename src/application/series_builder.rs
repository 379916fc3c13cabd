// Series builder - readings to aligned chart series
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::reading::Reading;
use crate::domain::series::{ChartDataset, SeriesSet};

pub const DEFAULT_MAX_CHART_POINTS: usize = 100;

/// Hue advance per series index. Coprime-ish with 360 so neighbouring series
/// land far apart on the wheel.
const HUE_STEP_DEGREES: f64 = 137.0;
const SERIES_SATURATION: f64 = 0.65;
const SERIES_LIGHTNESS: f64 = 0.50;

/// Coerce a payload value to a finite number the way the chart understands
/// them: numbers pass through, non-empty numeric strings are parsed,
/// everything else (including empty strings and non-finite results) is
/// `None`.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) if !s.trim().is_empty() => {
            s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Build the aligned series set for one batch of readings.
///
/// A key qualifies when at least one reading carries it as a number or a
/// numeric string; qualification is a union across the whole batch. Keys are
/// emitted in lexicographic order. Each series has one slot per reading,
/// `None` where the field was absent or not numeric.
pub fn build_series(readings: &[Reading]) -> SeriesSet {
    let timestamps: Vec<String> = readings.iter().map(|r| r.timestamp.clone()).collect();

    let mut keys: Vec<String> = readings
        .iter()
        .flat_map(|r| r.data.iter())
        .filter(|(_, value)| numeric_value(value).is_some())
        .map(|(key, _)| key.clone())
        .collect();
    keys.sort();
    keys.dedup();

    let mut series = HashMap::with_capacity(keys.len());
    for key in &keys {
        let values: Vec<Option<f64>> = readings
            .iter()
            .map(|r| r.data.get(key.as_str()).and_then(numeric_value))
            .collect();
        series.insert(key.clone(), values);
    }

    SeriesSet {
        timestamps,
        keys,
        series,
    }
}

/// Windowed chart datasets: for each key, the last `max_points` slots of its
/// series paired with the color for its position. Colors are purely
/// positional, so a stable key set keeps stable colors across refreshes.
pub fn chart_datasets(set: &SeriesSet, max_points: usize) -> Vec<ChartDataset> {
    set.keys
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let values = &set.series[key.as_str()];
            let start = values.len().saturating_sub(max_points);
            ChartDataset {
                key: key.clone(),
                color: series_color(index),
                points: values[start..].to_vec(),
            }
        })
        .collect()
}

/// The label window matching `chart_datasets`.
pub fn chart_labels(set: &SeriesSet, max_points: usize) -> Vec<String> {
    let start = set.timestamps.len().saturating_sub(max_points);
    set.timestamps[start..].to_vec()
}

/// Deterministic per-index series color: hue rotated by a fixed step, fixed
/// saturation and lightness.
pub fn series_color(index: usize) -> (u8, u8, u8) {
    let hue = (index as f64 * HUE_STEP_DEGREES) % 360.0;
    hsl_to_rgb(hue, SERIES_SATURATION, SERIES_LIGHTNESS)
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let hue_prime = hue / 60.0;
    let x = chroma * (1.0 - (hue_prime % 2.0 - 1.0).abs());

    let (r, g, b) = match hue_prime {
        h if h < 1.0 => (chroma, x, 0.0),
        h if h < 2.0 => (x, chroma, 0.0),
        h if h < 3.0 => (0.0, chroma, x),
        h if h < 4.0 => (0.0, x, chroma),
        h if h < 5.0 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading(timestamp: &str, data: Value) -> Reading {
        Reading::from_value(&json!({"timestamp": timestamp, "data": data}))
    }

    #[test]
    fn numeric_strings_qualify_and_parse() {
        let readings = vec![
            reading("2024-01-01T00:00:00Z", json!({"temp": 20, "status": "ok"})),
            reading("2024-01-01T00:00:03Z", json!({"temp": "21.5", "status": "ok"})),
        ];
        let set = build_series(&readings);
        assert_eq!(set.keys, vec!["temp"]);
        assert_eq!(set.series["temp"], vec![Some(20.0), Some(21.5)]);
        assert_eq!(
            set.timestamps,
            vec!["2024-01-01T00:00:00Z", "2024-01-01T00:00:03Z"]
        );
    }

    #[test]
    fn every_series_is_aligned_to_timestamps() {
        let readings = vec![
            reading("t1", json!({"a": 1, "b": 2})),
            reading("t2", json!({"b": 3})),
            reading("t3", json!({"a": 4, "c": "oops"})),
        ];
        let set = build_series(&readings);
        for key in &set.keys {
            assert_eq!(set.series[key.as_str()].len(), set.timestamps.len());
        }
    }

    #[test]
    fn missing_key_yields_null_not_zero() {
        let readings = vec![reading("t1", json!({"a": 1})), reading("t2", json!({}))];
        let set = build_series(&readings);
        assert_eq!(set.series["a"], vec![Some(1.0), None]);
    }

    #[test]
    fn qualification_is_a_union_across_readings() {
        // "a" is numeric only in the second reading; the non-numeric slot
        // becomes null, not an exclusion.
        let readings = vec![
            reading("t1", json!({"a": "abc"})),
            reading("t2", json!({"a": 7})),
        ];
        let set = build_series(&readings);
        assert_eq!(set.keys, vec!["a"]);
        assert_eq!(set.series["a"], vec![None, Some(7.0)]);
    }

    #[test]
    fn never_numeric_key_is_excluded() {
        let readings = vec![
            reading("t1", json!({"status": "abc", "note": {"x": 1}})),
            reading("t2", json!({"status": "def"})),
        ];
        let set = build_series(&readings);
        assert!(set.keys.is_empty());
    }

    #[test]
    fn empty_string_value_is_null() {
        let readings = vec![
            reading("t1", json!({"a": ""})),
            reading("t2", json!({"a": "2"})),
        ];
        let set = build_series(&readings);
        assert_eq!(set.series["a"], vec![None, Some(2.0)]);
    }

    #[test]
    fn keys_are_sorted_for_determinism() {
        let readings = vec![reading("t1", json!({"zeta": 1, "alpha": 2, "mid": 3}))];
        let set = build_series(&readings);
        assert_eq!(set.keys, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn empty_input_yields_empty_set() {
        let set = build_series(&[]);
        assert!(set.keys.is_empty());
        assert!(set.timestamps.is_empty());
        assert!(chart_datasets(&set, DEFAULT_MAX_CHART_POINTS).is_empty());
    }

    #[test]
    fn datasets_window_the_last_points() {
        let readings: Vec<Reading> = (0..10)
            .map(|i| reading(&format!("t{i}"), json!({"v": i})))
            .collect();
        let set = build_series(&readings);
        let datasets = chart_datasets(&set, 4);
        assert_eq!(datasets.len(), 1);
        assert_eq!(
            datasets[0].points,
            vec![Some(6.0), Some(7.0), Some(8.0), Some(9.0)]
        );
        assert_eq!(chart_labels(&set, 4), vec!["t6", "t7", "t8", "t9"]);
    }

    #[test]
    fn colors_are_stable_per_index() {
        assert_eq!(series_color(0), series_color(0));
        assert_ne!(series_color(0), series_color(1));

        // Appending a key later in sort order leaves earlier indices alone.
        let readings = vec![reading("t1", json!({"aaa": 1, "bbb": 2}))];
        let before = chart_datasets(&build_series(&readings), 10);
        let readings = vec![reading("t1", json!({"aaa": 1, "bbb": 2, "zzz": 3}))];
        let after = chart_datasets(&build_series(&readings), 10);
        assert_eq!(before[0].color, after[0].color);
        assert_eq!(before[1].color, after[1].color);
    }

    #[test]
    fn hsl_conversion_hits_known_anchors() {
        // Full-saturation, half-lightness primaries.
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), (255, 255, 255));
    }
}
