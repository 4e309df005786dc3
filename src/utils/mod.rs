//! Configuration and logging utilities

pub mod config;
pub mod logging;

pub use config::{ConfigError, EngineConfig, ValidationReport};
