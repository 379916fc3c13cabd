// Application layer - Use cases and orchestration
pub mod chart;
pub mod poller;
pub mod series_builder;
pub mod table_view;
pub mod telemetry_source;
