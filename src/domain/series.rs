// Chart series domain models
use std::collections::HashMap;

/// Aligned numeric time-series derived from one batch of readings.
///
/// `keys` is sorted so legend order and color assignment are stable across
/// refreshes. Every series has exactly one slot per reading; `None` marks a
/// missing or non-numeric value at that index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    pub timestamps: Vec<String>,
    pub keys: Vec<String>,
    pub series: HashMap<String, Vec<Option<f64>>>,
}

/// One chart line: a windowed view of a series plus its assigned color.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub key: String,
    pub color: (u8, u8, u8),
    pub points: Vec<Option<f64>>,
}

/// Everything the chart surface needs for one render generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartModel {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartModel {
    pub fn new(labels: Vec<String>, datasets: Vec<ChartDataset>) -> Self {
        Self { labels, datasets }
    }
}
