//! Mock collaborators.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use mindful_core::TargetId;
use mindful_gate::{BarrierUi, GateError, GateResult, OutboundMessage, PermissionGate};

/// Barrier UI that records every message it is asked to deliver.
///
/// Targets marked gone refuse delivery with [`GateError::Unreachable`],
/// like a tab closed mid-flow.
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    sent: Arc<Mutex<Vec<(TargetId, OutboundMessage)>>>,
    gone: Arc<Mutex<HashSet<TargetId>>>,
}

impl RecordingUi {
    /// Create a recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse delivery to `target` from now on.
    pub fn mark_gone(&self, target: TargetId) {
        if let Ok(mut gone) = self.gone.lock() {
            gone.insert(target);
        }
    }

    /// Every delivered message, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(TargetId, OutboundMessage)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages delivered to `target`, in order.
    #[must_use]
    pub fn messages_for(&self, target: TargetId) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, m)| m)
            .collect()
    }

    /// The last message delivered to `target`.
    #[must_use]
    pub fn last_for(&self, target: TargetId) -> Option<OutboundMessage> {
        self.messages_for(target).pop()
    }

    /// Drain and return every delivered message.
    pub fn take(&self) -> Vec<(TargetId, OutboundMessage)> {
        self.sent
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }
}

#[async_trait]
impl BarrierUi for RecordingUi {
    async fn send(&self, target: TargetId, message: OutboundMessage) -> GateResult<()> {
        let gone = self.gone.lock().is_ok_and(|g| g.contains(&target));
        if gone {
            return Err(GateError::Unreachable {
                target,
                reason: "tab closed".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((target, message));
        }
        Ok(())
    }
}

/// Permission gate with a fixed answer that records every origin asked for.
#[derive(Debug, Clone)]
pub struct StaticPermissions {
    grant: bool,
    requested: Arc<Mutex<Vec<String>>>,
    revoked: Arc<Mutex<Vec<String>>>,
}

impl StaticPermissions {
    /// Grants every request.
    #[must_use]
    pub fn granting() -> Self {
        Self::with_answer(true)
    }

    /// Denies every request.
    #[must_use]
    pub fn denying() -> Self {
        Self::with_answer(false)
    }

    fn with_answer(grant: bool) -> Self {
        Self {
            grant,
            requested: Arc::new(Mutex::new(Vec::new())),
            revoked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Origins requested so far.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Origins revoked so far.
    #[must_use]
    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PermissionGate for StaticPermissions {
    async fn request(&self, origin: &str) -> bool {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(origin.to_string());
        }
        self.grant
    }

    async fn revoke(&self, origin: &str) {
        if let Ok(mut revoked) = self.revoked.lock() {
            revoked.push(origin.to_string());
        }
    }
}
