//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mindful_approval::prelude::*;` to import all essential types.

pub use crate::{
    ApprovalError, ApprovalLedger, ApprovalRecord, ApprovalResult, ExpiryFired, ExpirySchedule,
    ExpiryTimers, TargetState,
};
