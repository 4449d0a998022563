//! Mindful Gate - decides, for every navigation, whether a tab must justify
//! itself before it may proceed.
//!
//! This crate provides:
//! - [`site`]: blocklist matching by hostname and subdomain
//! - [`SettingsStore`]: the blocklist, toggle, window length and reason
//!   history, persisted in the `settings` namespace
//! - [`protocol`]: the tagged messages exchanged with the barrier UI
//! - [`GateController`]: the single event loop tying matching, validation
//!   and the approval ledger together
//!
//! # Failure policy
//!
//! Nothing in the gate is fatal. Bad input is answered with a negative
//! result, an unreadable settings store turns the gate off, and a UI that
//! cannot be reached releases its tab.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod controller;
pub mod error;
pub mod protocol;
pub mod settings;
pub mod site;

pub use controller::{
    BarrierUi, GateController, GateEvent, GateHandle, NavigationDecision, SubmissionOutcome,
};
pub use error::{GateError, GateResult};
pub use protocol::{InboundFrame, InboundMessage, OutboundFrame, OutboundMessage};
pub use settings::{
    AddSiteOutcome, AllowAllPermissions, HistoryEntry, HistoryGroup, PermissionGate, Settings,
    SettingsStore,
};
