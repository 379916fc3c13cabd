// HTTP request handlers
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::reading::Reading;
use crate::infrastructure::store::{DEFAULT_QUERY_LIMIT, StoreError};
use crate::presentation::app_state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/devices", post(register_device).get(list_devices))
        .route("/telemetry", post(ingest_telemetry))
        .route("/telemetry/:device_id", get(query_telemetry))
        .route("/api/telemetry/:device_id", get(recent_telemetry))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct RegisterRequest {
    device_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    meta: Map<String, Value>,
}

/// Register a device; the id is generated when the caller omits one.
async fn register_device(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let device_id = request
        .device_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut meta = request.meta;
    meta.insert("name".to_string(), json!(request.name));

    match state.store.register_device(&device_id, meta) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({"device_id": device_id})),
        )
            .into_response(),
        Err(StoreError::DeviceExists(_)) => (
            StatusCode::CONFLICT,
            Json(json!({"error": "device already exists"})),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}

async fn list_devices(State(state): State<AppState>) -> Response {
    match state.store.list_devices() {
        Ok(devices) => Json(devices).into_response(),
        Err(err) => internal_error(err),
    }
}

/// Accept one reading for a device. A missing or empty timestamp is filled
/// with the current UTC time.
async fn ingest_telemetry(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let Some(device_id) = payload.get("device_id").and_then(Value::as_str) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "device_id required"})),
        )
            .into_response();
    };

    let timestamp = payload
        .get("timestamp")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true));

    let data = match payload.get("data") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    match state
        .store
        .store_telemetry(device_id, Reading::new(timestamp, data))
    {
        Ok(()) => (StatusCode::CREATED, Json(json!({"status": "ok"}))).into_response(),
        Err(StoreError::UnknownDevice(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown device"})),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<usize>,
}

/// Query readings for a device with an optional time range.
async fn query_telemetry(
    Path(device_id): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
    match state.store.get_telemetry(
        &device_id,
        query.start.as_deref(),
        query.end.as_deref(),
        limit,
    ) {
        Ok(items) => Json(items).into_response(),
        Err(err) => internal_error(err),
    }
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// The dashboard's endpoint: the last N readings as a JSON array. Unknown
/// devices yield an empty array.
async fn recent_telemetry(
    Path(device_id): Path<String>,
    Query(query): Query<LimitQuery>,
    State(state): State<AppState>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
    match state.store.get_telemetry(&device_id, None, None, limit) {
        Ok(items) => Json(items).into_response(),
        Err(err) => internal_error(err),
    }
}

fn internal_error(err: StoreError) -> Response {
    tracing::error!("store operation failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal error"})),
    )
        .into_response()
}
