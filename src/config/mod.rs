//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, endpoints)
//! - The [`Config`] struct and environment-variable loading

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
