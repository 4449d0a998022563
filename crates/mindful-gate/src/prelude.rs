//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mindful_gate::prelude::*;` to import all essential types.

pub use crate::{
    BarrierUi, GateController, GateError, GateEvent, GateHandle, GateResult, InboundFrame,
    InboundMessage, OutboundMessage, PermissionGate, Settings, SettingsStore,
};
