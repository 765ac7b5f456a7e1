//! Shared utilities for the election engine.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::{format_duration, minutes_to_secs};
