// Device telemetry: ingest/query service plus a polling terminal dashboard
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod tui;
