// Poll scheduler - one repeating refresh task, guarded against double start
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::application::chart::ChartLifecycle;
use crate::application::series_builder::{
    DEFAULT_MAX_CHART_POINTS, build_series, chart_datasets, chart_labels,
};
use crate::application::table_view::{TableRow, table_rows};
use crate::application::telemetry_source::{DEFAULT_FETCH_LIMIT, FetchError, TelemetrySource};
use crate::domain::reading::Reading;
use crate::domain::series::ChartModel;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub fetch_limit: usize,
    pub max_chart_points: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            max_chart_points: DEFAULT_MAX_CHART_POINTS,
        }
    }
}

/// Shared dashboard state: the single chart slot, the published table rows,
/// and cycle diagnostics. Constructed once at monitor startup and shared by
/// `Arc` between the scheduler and the UI loop.
#[derive(Default)]
pub struct DashboardState {
    pub chart: ChartLifecycle,
    table: RwLock<Vec<TableRow>>,
    cycles: AtomicU64,
    last_error: RwLock<Option<String>>,
    last_updated: RwLock<Option<DateTime<Local>>>,
}

impl DashboardState {
    pub fn table(&self) -> Vec<TableRow> {
        self.table.read().unwrap().clone()
    }

    /// Refresh cycles attempted so far, including failed ones.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// The most recent cycle failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        *self.last_updated.read().unwrap()
    }
}

/// Drives periodic refresh with a single repeating task.
///
/// `start` is a guarded check-then-create: while a poll task is live a second
/// activation is a no-op, so repeated starts can never stack concurrent
/// polling loops. Cycles run to completion inside the task before the next
/// tick is honoured, so a slow fetch delays polling instead of overlapping
/// it.
pub struct PollScheduler {
    source: Arc<dyn TelemetrySource>,
    state: Arc<DashboardState>,
    settings: PollSettings,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        state: Arc<DashboardState>,
        settings: PollSettings,
    ) -> Self {
        Self {
            source,
            state,
            settings,
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    /// Activate polling: one immediate refresh, then one refresh per
    /// interval. Returns false (and does nothing) when already active.
    pub fn start(&self) -> bool {
        let mut handle = self.handle.lock().unwrap();
        if handle.is_some() {
            return false;
        }

        let source = self.source.clone();
        let state = self.state.clone();
        let settings = self.settings.clone();
        *handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval(settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // The first tick resolves immediately.
                ticker.tick().await;
                run_cycle(source.as_ref(), &state, &settings).await;
            }
        }));
        true
    }

    /// Cancel the active poll task; no-op when idle. Does not abort a fetch
    /// already in flight beyond dropping its task.
    pub fn stop(&self) {
        if let Some(task) = self.handle.lock().unwrap().take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }

    /// Run a single refresh outside the repeating schedule.
    pub fn refresh_now(&self) {
        let source = self.source.clone();
        let state = self.state.clone();
        let settings = self.settings.clone();
        tokio::spawn(async move {
            run_cycle(source.as_ref(), &state, &settings).await;
        });
    }
}

/// One poll cycle. Every failure is contained here and logged; nothing
/// escapes to kill the scheduler.
pub async fn run_cycle(
    source: &dyn TelemetrySource,
    state: &DashboardState,
    settings: &PollSettings,
) {
    state.cycles.fetch_add(1, Ordering::Relaxed);
    match refresh(source, state, settings).await {
        Ok(()) => {
            *state.last_error.write().unwrap() = None;
        }
        Err(err) => {
            tracing::warn!("refresh cycle failed: {err}");
            *state.last_error.write().unwrap() = Some(err.to_string());
        }
    }
}

async fn refresh(
    source: &dyn TelemetrySource,
    state: &DashboardState,
    settings: &PollSettings,
) -> Result<(), FetchError> {
    let payload = source.fetch_recent(settings.fetch_limit).await?;

    let Some(readings) = Reading::from_response(&payload) else {
        tracing::debug!("telemetry response is not an array; skipping this cycle");
        return Ok(());
    };

    let rows = table_rows(&readings);
    let set = build_series(&readings);
    let datasets = chart_datasets(&set, settings.max_chart_points);
    let labels = chart_labels(&set, settings.max_chart_points);

    *state.table.write().unwrap() = rows;
    state.chart.install(ChartModel::new(labels, datasets));
    *state.last_updated.write().unwrap() = Some(Local::now());
    Ok(())
}
