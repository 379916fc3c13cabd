// Source trait for telemetry data access
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_FETCH_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint answered with a non-success status; the body text is the
    /// failure detail.
    #[error("telemetry endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("telemetry request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the most recent readings for the watched device, bounded by
    /// `limit`.
    ///
    /// Returns the decoded response body as-is. Array-shape validation is
    /// left to the caller; a non-array body means "nothing to render", not a
    /// failure.
    async fn fetch_recent(&self, limit: usize) -> Result<Value, FetchError>;
}
