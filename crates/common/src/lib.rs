//! Reelwright Common Utilities
//!
//! Shared infrastructure for all Reelwright crates:
//! - Error types and result aliases
//! - Tracing/logging initialization
//! - Configuration loading and environment overrides

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
