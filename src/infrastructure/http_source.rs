// HTTP implementation of the telemetry source
use async_trait::async_trait;
use serde_json::Value;

use crate::application::telemetry_source::{FetchError, TelemetrySource};

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    base_url: String,
    device_id: String,
    client: reqwest::Client,
}

impl HttpTelemetrySource {
    pub fn new(base_url: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            device_id: device_id.into(),
            client: reqwest::Client::new(),
        }
    }

    fn readings_url(&self, limit: usize) -> String {
        format!(
            "{}/api/telemetry/{}?limit={}",
            self.base_url,
            urlencoding::encode(&self.device_id),
            limit
        )
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_recent(&self, limit: usize) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(self.readings_url(limit))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        Ok(response.json::<Value>().await?)
    }
}
