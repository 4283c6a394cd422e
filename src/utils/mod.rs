//! Utility functions and helpers
//!
//! This module contains timestamp utilities and the shutdown signal.

pub mod shutdown;
pub mod time;

pub use shutdown::ShutdownSignal;
pub use time::{current_timestamp, format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
