//! Logging utilities.
//!
//! Centralizes logger initialization over the `log` facade with `env_logger`
//! as the backend.

mod init;

pub use init::{init_logging, LoggingConfig};
