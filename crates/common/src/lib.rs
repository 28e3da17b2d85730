//! Lumen Common Utilities
//!
//! Shared infrastructure for all Lumen crates:
//! - Error types and result aliases
//! - The export clock used for filename timestamp tokens
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
