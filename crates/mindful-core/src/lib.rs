//! Mindful Core - shared types for the navigation gate.
//!
//! This crate provides:
//! - [`TargetId`], the opaque identifier of one browsing context (a tab)
//! - [`Timestamp`], a UTC instant with millisecond helpers
//! - The [`Clock`] trait with a wall clock and a manually driven clock
//!
//! Every other mindful crate speaks in these types, so time is always read
//! through a [`Clock`] and never straight from the system.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod clock;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{TargetId, Timestamp};
