//! Logging utilities.
//!
//! This module centralizes logger initialization. It installs `env_logger`
//! behind the standard `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
