//! Hunter Common - Shared utilities: configuration and logging
//!
//! This crate provides common functionality used by the Hunter binaries.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigBuilder, LoggingConfig, ScanProfile, ScannerConfig};
pub use logging::{init_logging, init_logging_with_config, try_init_logging, LogConfig, LogFormat};
