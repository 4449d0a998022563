//! Prelude module - commonly used test helpers.

pub use crate::{RecordingUi, StaticPermissions, TestGate, VALID_REASON, init_test_logging};
