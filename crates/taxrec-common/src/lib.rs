//! Taxrec Common Library
//!
//! Shared error handling and logging setup for the taxrec workspace.
//!
//! # Example
//!
//! ```no_run
//! use taxrec_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
