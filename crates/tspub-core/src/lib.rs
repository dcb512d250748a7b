//! tspub core library
//!
//! Domain models, error types and operator settings shared by every crate of
//! the marketplace publishing tool.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{FailurePolicy, Settings, DEFAULT_SETTINGS_FILE};
pub use error::{LogLevel, PublishError, PublishResult};
