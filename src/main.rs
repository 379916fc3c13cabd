// Main entry point - CLI dispatch and wiring
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use device_telemetry::application::poller::{DashboardState, PollScheduler, PollSettings};
use device_telemetry::infrastructure::config::{load_dashboard_config, load_server_config};
use device_telemetry::infrastructure::http_source::HttpTelemetrySource;
use device_telemetry::infrastructure::store::FileStore;
use device_telemetry::presentation::app_state::AppState;
use device_telemetry::presentation::handlers;
use device_telemetry::tui::app::DashboardApp;

#[derive(Parser)]
#[command(name = "device-telemetry")]
#[command(about = "Device telemetry service and single-device terminal dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the telemetry ingest/query HTTP service
    Serve {
        /// Listen address, e.g. 0.0.0.0:5000
        #[arg(long)]
        listen: Option<String>,

        /// Path of the JSON data file
        #[arg(long)]
        data_file: Option<PathBuf>,
    },

    /// Watch one device: poll its telemetry and render a table plus chart
    Monitor {
        /// Device id to watch
        #[arg(long)]
        device: Option<String>,

        /// Base URL of the telemetry service
        #[arg(long)]
        endpoint: Option<String>,

        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Readings fetched per poll
        #[arg(long)]
        limit: Option<usize>,

        /// Points kept per chart series
        #[arg(long)]
        max_points: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the dashboard screen stays clean; enable them
    // with RUST_LOG and redirect as needed.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Serve { listen, data_file } => serve(listen, data_file),
        Commands::Monitor {
            device,
            endpoint,
            interval_ms,
            limit,
            max_points,
        } => monitor(device, endpoint, interval_ms, limit, max_points),
    }
}

fn serve(listen: Option<String>, data_file: Option<PathBuf>) -> anyhow::Result<()> {
    let mut cfg = load_server_config()?;
    if let Some(listen) = listen {
        cfg.listen = listen;
    }
    if let Some(data_file) = data_file {
        cfg.data_file = data_file;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let store = Arc::new(FileStore::new(cfg.data_file));
        let router = handlers::router(AppState { store });

        let addr: SocketAddr = cfg.listen.parse()?;
        tracing::info!("starting device-telemetry service on {addr}");
        println!("device-telemetry service listening on {addr}");

        axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;
        Ok(())
    })
}

fn monitor(
    device: Option<String>,
    endpoint: Option<String>,
    interval_ms: Option<u64>,
    limit: Option<usize>,
    max_points: Option<usize>,
) -> anyhow::Result<()> {
    let mut cfg = load_dashboard_config()?;
    if let Some(device) = device {
        cfg.device_id = device;
    }
    if let Some(endpoint) = endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(interval_ms) = interval_ms {
        cfg.poll_interval_ms = interval_ms;
    }
    if let Some(limit) = limit {
        cfg.fetch_limit = limit;
    }
    if let Some(max_points) = max_points {
        cfg.max_chart_points = max_points;
    }

    // The UI loop stays on this thread; the poll task runs on the runtime.
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source = Arc::new(HttpTelemetrySource::new(&cfg.endpoint, &cfg.device_id));
    let state = Arc::new(DashboardState::default());
    let scheduler = Arc::new(PollScheduler::new(
        source,
        state.clone(),
        PollSettings {
            interval: Duration::from_millis(cfg.poll_interval_ms),
            fetch_limit: cfg.fetch_limit,
            max_chart_points: cfg.max_chart_points,
        },
    ));

    let mut app = DashboardApp::new(state, scheduler, cfg.device_id, cfg.endpoint);
    app.run()?;
    Ok(())
}
