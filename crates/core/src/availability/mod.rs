//! Per-slot availability and occupancy computation.

pub mod engine;

pub use engine::{compute_availability, compute_occupancy};
