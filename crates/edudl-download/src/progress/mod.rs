//! Progress tracking and throttling.
//!
//! This module decides when a progress change is worth a snapshot.

mod throttle;

pub use throttle::ProgressThrottle;
