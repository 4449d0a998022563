//! Mindful Approval - who may see a gated site, and until when.
//!
//! This crate provides:
//! - [`ApprovalLedger`]: per-target approval state with grant, check,
//!   expire and release
//! - [`ExpirySchedule`]: the durable expiry entries, one per approved
//!   target, stored under `expiry:{target}`
//! - [`ExpiryTimers`]: best-effort in-process timers that fire ahead of the
//!   durable sweep
//!
//! # Lifecycle
//!
//! ```text
//! UNGATED --barrier shown--> PENDING_REVIEW --grant--> APPROVED
//!    ^                                                     |
//!    +------------ expire / release / navigate away -------+
//! ```
//!
//! The durable schedule is authoritative. The in-memory records are a cache
//! rebuilt from it by [`ApprovalLedger::rehydrate`], and every approval check
//! recomputes the answer from the stored fire time.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod ledger;
mod record;
mod schedule;
mod timers;

pub use error::{ApprovalError, ApprovalResult};
pub use ledger::ApprovalLedger;
pub use record::{ApprovalRecord, ScheduledExpiry, TargetState};
pub use schedule::{EXPIRY_KEY_PREFIX, ExpirySchedule, SCHEDULE_NAMESPACE};
pub use timers::{ExpiryFired, ExpiryTimers};
