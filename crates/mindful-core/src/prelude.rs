//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mindful_core::prelude::*;` to import all essential types.

pub use crate::{Clock, ManualClock, SystemClock, TargetId, Timestamp};
