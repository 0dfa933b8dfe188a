//! # Roomly Infra
//!
//! Adapters connecting the booking core to the outside world:
//! - `http`: reqwest client implementing the core's port traits against the
//!   booking REST service, with structured failure classification
//! - `config`: environment-first configuration loader with file fallback
//! - `telemetry`: tracing subscriber setup

pub mod config;
pub mod http;
pub mod telemetry;

pub use http::HttpBookingClient;
