//! Mindful Telemetry - logging for the navigation gate.
//!
//! A thin layer over `tracing-subscriber`: pick a level, a format and a
//! destination in a [`LogConfig`], then call [`setup_logging`] once at
//! process start.
//!
//! # Example
//!
//! ```rust,no_run
//! use mindful_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), mindful_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("mindful_approval=debug");
//! setup_logging(&config)?;
//! tracing::info!("gate starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
