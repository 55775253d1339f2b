//! PASS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared configuration, logging, and error handling for the PASS data client
//! workspace.
//!
//! # Overview
//!
//! - **Configuration**: connection settings for the PASS repository, read from
//!   the environment (and a `.env` file when present)
//! - **Logging**: one place to install the `tracing` subscriber for binaries
//! - **Errors**: the error type for configuration and logging setup
//!
//! # Example
//!
//! ```no_run
//! use pass_common::config::PassConfig;
//! use pass_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> pass_common::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     let config = PassConfig::from_env()?;
//!     tracing::info!(url = %config.base_url, "PASS repository configured");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CommonError, Result};
