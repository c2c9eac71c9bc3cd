pub mod config;
pub mod error;
pub mod export;
pub mod reporting;
pub mod request;
pub mod telemetry;
