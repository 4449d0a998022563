#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Daemon configuration for the mindful navigation gate.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mindful_config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("listening on {}", config.server.address());
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** passed with `--config`
//! 2. **User** (`~/.mindful/config.toml`)
//! 3. **Environment variables** (`MINDFUL_LOG_LEVEL`, `MINDFUL_PORT`,
//!    `MINDFUL_DATA_DIR`), applied only to fields no file set
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate depends on no other mindful crate. The binary converts these
//! sections into domain types at startup.
//!
//! Gate settings (blocklist, on/off, window length) are not configured
//! here; they live in the settings store and are edited at run time.

mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(explicit)
    }
}
