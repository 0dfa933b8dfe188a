//! Time abstraction for testability.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
