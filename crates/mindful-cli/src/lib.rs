//! Mindful CLI - hosts the gate controller for the browser extension.
//!
//! The `mindful` binary is a thin shell over this library:
//! - [`server`]: the WebSocket bridge the extension connects to
//! - [`store`]: opens the configured key-value backend
//! - [`config_bridge`]: converts daemon configuration into domain types

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod server;
pub mod store;
