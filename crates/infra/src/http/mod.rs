//! HTTP adapter for the booking service.

pub mod client;

pub use client::HttpBookingClient;
