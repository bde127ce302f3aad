//! Standardized logging configuration.
//!
//! Components log through `tracing` with structured fields; this module
//! provides a consistent subscriber setup for binaries and tests.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: standard tracing filter (e.g., `info`, `exec_core=debug`)
//! - `LOG_FORMAT`: output format - `pretty` (default), `compact`, or `json`

mod config;

pub use config::{init_logging, LogConfig, LogFormat};
