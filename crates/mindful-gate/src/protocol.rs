//! Messages exchanged with the barrier UI.
//!
//! Every message is a JSON object tagged by `type`. On the wire each one
//! travels in a frame that also names the tab:
//!
//! ```json
//! {"tabId": 12, "type": "BARRIER_APPROVED", "reason": "...", "site": "reddit.com"}
//! ```

use mindful_core::TargetId;
use serde::{Deserialize, Serialize};

/// Controller to UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    /// Show the justification prompt.
    ShowBarrier {
        /// The gated URL.
        url: String,
        /// Site name for display.
        site: String,
        /// Minimum reason length.
        #[serde(rename = "minChars")]
        min_chars: usize,
    },
    /// The reason was accepted; show the countdown.
    StartTimer {
        /// Window length in milliseconds.
        #[serde(rename = "durationMs")]
        duration_ms: u64,
        /// Window length in minutes.
        #[serde(rename = "timerMinutes")]
        timer_minutes: u32,
    },
    /// The window closed; ask for a new reason.
    TimeExpired,
    /// The reason was not accepted; keep the barrier open.
    BarrierRejected {
        /// Messages to show, in order.
        errors: Vec<String>,
    },
    /// Close the tab.
    CloseTarget,
}

/// UI to controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// The tab finished loading `url`, or was activated showing it.
    NavigationCompleted {
        /// The tab's URL.
        url: String,
    },
    /// A reason was submitted.
    BarrierApproved {
        /// The reason as typed.
        reason: String,
        /// Site name shown on the barrier.
        site: String,
    },
    /// The user declined to give a reason.
    CloseTab,
    /// The tab is gone.
    TabClosed,
}

/// An inbound message with the tab it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Source tab.
    #[serde(rename = "tabId")]
    pub tab_id: TargetId,
    /// The message.
    #[serde(flatten)]
    pub message: InboundMessage,
}

impl InboundFrame {
    /// Wrap `message` from `tab_id`.
    #[must_use]
    pub fn new(tab_id: TargetId, message: InboundMessage) -> Self {
        Self { tab_id, message }
    }
}

/// An outbound message with the tab it is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Destination tab.
    #[serde(rename = "tabId")]
    pub tab_id: TargetId,
    /// The message.
    #[serde(flatten)]
    pub message: OutboundMessage,
}

impl OutboundFrame {
    /// Wrap `message` for `tab_id`.
    #[must_use]
    pub fn new(tab_id: TargetId, message: OutboundMessage) -> Self {
        Self { tab_id, message }
    }
}
