//! Dashboard rendering: title bar, readings table, line chart, key bar.

use std::sync::Arc;

use chrono::{DateTime, Local};
use ratatui::{prelude::*, widgets::*};

use crate::application::table_view::TableRow;
use crate::domain::series::{ChartDataset, ChartModel};

/// The chart strip always gets the full width and this fixed height.
const CHART_HEIGHT: u16 = 14;

/// One frame's worth of display data, snapshotted from the shared state so
/// rendering never holds a lock.
pub struct FrameData {
    pub device_id: String,
    pub endpoint: String,
    pub cycles: u64,
    pub last_updated: Option<String>,
    pub paused: bool,
    pub rows: Vec<TableRow>,
    pub chart: Option<Arc<ChartModel>>,
}

pub fn draw(f: &mut Frame, data: &FrameData) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // title
            Constraint::Min(6),               // readings table
            Constraint::Length(CHART_HEIGHT), // chart
            Constraint::Length(1),            // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], data);
    draw_table(f, rows[1], data);
    draw_chart(f, rows[2], data);
    draw_keys(f, rows[3]);
}

fn draw_title(f: &mut Frame, area: Rect, data: &FrameData) {
    let updated = data.last_updated.as_deref().unwrap_or("—");
    let paused = if data.paused { "  ⏸ paused" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" telemetry ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(&data.device_id, Style::default().bold().fg(Color::Yellow)),
            Span::styled(
                format!("  {}  cycle #{}  updated {updated}{paused} ", data.endpoint, data.cycles),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    f.render_widget(block, area);
}

fn draw_table(f: &mut Frame, area: Rect, data: &FrameData) {
    let rows: Vec<Row> = data
        .rows
        .iter()
        .map(|row| {
            Row::new(vec![
                row.index.to_string(),
                row.time_label.clone(),
                row.payload.clone(),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(20),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["#", "time", "data"]).style(Style::default().bold().fg(Color::Cyan)),
    )
    .block(Block::default().borders(Borders::ALL).title(" readings "));

    f.render_widget(table, area);
}

fn draw_chart(f: &mut Frame, area: Rect, data: &FrameData) {
    let Some(model) = &data.chart else {
        let block = Block::default().borders(Borders::ALL).title(" chart ");
        let p = Paragraph::new("waiting for data")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    };

    let segments = chart_segments(model);
    let datasets: Vec<Dataset> = segments
        .iter()
        .map(|segment| {
            let mut dataset = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Rgb(
                    segment.color.0,
                    segment.color.1,
                    segment.color.2,
                )))
                .data(&segment.points);
            if let Some(name) = &segment.name {
                dataset = dataset.name(name.clone());
            }
            dataset
        })
        .collect();

    let slots = model
        .datasets
        .iter()
        .map(|d| d.points.len())
        .max()
        .unwrap_or(0);
    let x_max = (slots.saturating_sub(1)).max(1) as f64;
    let (y_min, y_max) = y_bounds(&segments);

    let x_labels = vec![
        Line::from(short_label(model.labels.first())),
        Line::from(short_label(model.labels.last())),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" chart "))
        .legend_position(Some(LegendPosition::Top))
        .x_axis(
            Axis::default()
                .title("time")
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(Axis::default().title("value").bounds([y_min, y_max]).labels(vec![
            Line::from(format!("{y_min:.1}")),
            Line::from(format!("{y_max:.1}")),
        ]));

    f.render_widget(chart, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" q: quit   p: pause/resume   r: refresh now")
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

/// A contiguous run of plotted points for one series. Only a series' first
/// segment carries the name, so the legend shows each key once.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    name: Option<String>,
    color: (u8, u8, u8),
    points: Vec<(f64, f64)>,
}

/// Split every dataset into contiguous runs of present values. A `None` slot
/// ends the current run, so gaps render as visible breaks instead of
/// interpolated lines.
fn chart_segments(model: &ChartModel) -> Vec<Segment> {
    let mut segments = Vec::new();
    for dataset in &model.datasets {
        let mut named = false;
        let mut run: Vec<(f64, f64)> = Vec::new();
        for (i, slot) in dataset.points.iter().enumerate() {
            match slot {
                Some(value) => run.push((i as f64, *value)),
                None => flush_run(&mut segments, &mut run, dataset, &mut named),
            }
        }
        flush_run(&mut segments, &mut run, dataset, &mut named);
    }
    segments
}

fn flush_run(
    segments: &mut Vec<Segment>,
    run: &mut Vec<(f64, f64)>,
    dataset: &ChartDataset,
    named: &mut bool,
) {
    if run.is_empty() {
        return;
    }
    segments.push(Segment {
        name: if *named {
            None
        } else {
            *named = true;
            Some(dataset.key.clone())
        },
        color: dataset.color,
        points: std::mem::take(run),
    });
}

/// Y bounds padded around the data; never forced to start at zero.
fn y_bounds(segments: &[Segment]) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for segment in segments {
        for &(_, value) in &segment.points {
            min = min.min(value);
            max = max.max(value);
        }
    }
    if min > max {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(0.5);
    (min - pad, max + pad)
}

fn short_label(label: Option<&String>) -> String {
    let Some(label) = label else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(label) {
        Ok(parsed) => parsed.with_timezone(&Local).format("%H:%M:%S").to_string(),
        Err(_) => label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with(points: Vec<Option<f64>>) -> ChartModel {
        ChartModel::new(
            (0..points.len()).map(|i| format!("t{i}")).collect(),
            vec![ChartDataset {
                key: "temp".into(),
                color: (10, 20, 30),
                points,
            }],
        )
    }

    #[test]
    fn gaps_split_a_series_into_segments() {
        let model = model_with(vec![Some(1.0), Some(2.0), None, Some(4.0)]);
        let segments = chart_segments(&model);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points, vec![(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(segments[1].points, vec![(3.0, 4.0)]);
        // One legend entry per key.
        assert_eq!(segments[0].name.as_deref(), Some("temp"));
        assert!(segments[1].name.is_none());
        assert_eq!(segments[0].color, segments[1].color);
    }

    #[test]
    fn all_null_series_produces_no_segments() {
        let model = model_with(vec![None, None]);
        assert!(chart_segments(&model).is_empty());
    }

    #[test]
    fn y_bounds_are_not_forced_to_zero() {
        let model = model_with(vec![Some(10.0), Some(20.0)]);
        let (lo, hi) = y_bounds(&chart_segments(&model));
        assert!(lo > 0.0, "lower bound hugs the data, got {lo}");
        assert!(lo < 10.0 && hi > 20.0);
    }

    #[test]
    fn empty_chart_uses_fallback_bounds() {
        assert_eq!(y_bounds(&[]), (0.0, 1.0));
    }

    #[test]
    fn short_label_falls_back_to_raw_text() {
        assert_eq!(short_label(Some(&"garbage".to_string())), "garbage");
        assert_eq!(short_label(None), "");
        let formatted = short_label(Some(&"2024-01-01T00:00:03Z".to_string()));
        assert_eq!(formatted.len(), 8);
    }
}
