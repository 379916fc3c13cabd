// Configuration loading for the dashboard and the service
use serde::Deserialize;
use std::path::PathBuf;

use crate::application::poller::DEFAULT_POLL_INTERVAL_MS;
use crate::application::series_builder::DEFAULT_MAX_CHART_POINTS;
use crate::application::telemetry_source::DEFAULT_FETCH_LIMIT;

/// Settings for `monitor`. File values come from `config/dashboard`,
/// overridable through `TELEMETRY_*` environment variables and CLI flags.
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_max_chart_points")]
    pub max_chart_points: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            device_id: default_device_id(),
            poll_interval_ms: default_poll_interval_ms(),
            fetch_limit: default_fetch_limit(),
            max_chart_points: default_max_chart_points(),
        }
    }
}

/// Settings for `serve`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            data_file: default_data_file(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_device_id() -> String {
    "demo-device".to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

fn default_max_chart_points() -> usize {
    DEFAULT_MAX_CHART_POINTS
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("TELEMETRY"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(config::Environment::with_prefix("TELEMETRY_SERVER"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_defaults_match_the_poll_contract() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.poll_interval_ms, 3000);
        assert_eq!(cfg.fetch_limit, 200);
        assert_eq!(cfg.max_chart_points, 100);
    }

    #[test]
    fn server_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen, "0.0.0.0:5000");
        assert_eq!(cfg.data_file, PathBuf::from("data.json"));
    }
}
