//! The approval ledger.

use mindful_core::{Clock, TargetId, Timestamp};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ApprovalError, ApprovalResult};
use crate::record::{ApprovalRecord, TargetState};
use crate::schedule::ExpirySchedule;
use crate::timers::{ExpiryFired, ExpiryTimers};

/// Per-target approval state.
///
/// Owned by a single event loop, so methods take `&mut self` and nothing is
/// locked. Every record is paired with a durable [`ExpirySchedule`] entry
/// and a fast-path timer; the three are created and destroyed together.
///
/// # Example
///
/// ```
/// use mindful_approval::{ApprovalLedger, ExpirySchedule, ExpiryTimers, TargetState};
/// use mindful_core::{ManualClock, TargetId};
/// use mindful_storage::MemoryKvStore;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let clock = Arc::new(ManualClock::new());
/// let schedule = ExpirySchedule::new(Arc::new(MemoryKvStore::new())).unwrap();
/// let (timers, _expired) = ExpiryTimers::channel();
/// let mut ledger = ApprovalLedger::new(clock.clone(), schedule, timers);
///
/// let tab = TargetId::new(1);
/// ledger.grant(tab, Duration::from_secs(300), None).await.unwrap();
/// assert!(ledger.is_approved(tab).await);
///
/// clock.advance(Duration::from_secs(301));
/// assert!(!ledger.is_approved(tab).await);
/// assert_eq!(ledger.state(tab), TargetState::Ungated);
/// # });
/// ```
pub struct ApprovalLedger {
    clock: Arc<dyn Clock>,
    schedule: ExpirySchedule,
    timers: ExpiryTimers,
    records: HashMap<TargetId, ApprovalRecord>,
    pending: HashSet<TargetId>,
}

impl ApprovalLedger {
    /// Create an empty ledger. Call [`ApprovalLedger::rehydrate`] to load
    /// windows that survived a restart.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, schedule: ExpirySchedule, timers: ExpiryTimers) -> Self {
        Self {
            clock,
            schedule,
            timers,
            records: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    /// The clock the ledger reads.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Open an approval window of `duration` starting now.
    ///
    /// Replaces any existing window for `target`: a re-grant restarts the
    /// window, it never extends the old one.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::EmptyWindow`] for a zero duration, or a
    /// storage error if the durable entry cannot be written. The ledger is
    /// unchanged on error.
    pub async fn grant(
        &mut self,
        target: TargetId,
        duration: Duration,
        site: Option<String>,
    ) -> ApprovalResult<ApprovalRecord> {
        if duration.is_zero() {
            return Err(ApprovalError::EmptyWindow);
        }

        let record = ApprovalRecord::new(target, self.clock.now(), duration, site);
        self.schedule.arm(&record.to_schedule()).await?;
        self.timers.arm(target, record.expires_at(), duration);
        self.pending.remove(&target);

        let replaced = self.records.insert(target, record.clone()).is_some();
        tracing::info!(
            target_id = %target,
            site = record.site.as_deref().unwrap_or("-"),
            duration_ms = record.duration_ms,
            replaced,
            "Approval granted"
        );
        Ok(record)
    }

    /// Whether `target` is inside an approval window right now.
    ///
    /// Falls back to the durable schedule when the record is not cached,
    /// so a window granted before a restart is honoured. A window that has
    /// closed without its expiry being processed is cleared here.
    pub async fn is_approved(&mut self, target: TargetId) -> bool {
        let now = self.clock.now();

        if let Some(record) = self.records.get(&target) {
            if record.is_live(now) {
                return true;
            }
            tracing::debug!(target_id = %target, "Clearing stale approval");
            self.clear(target).await;
            return false;
        }

        match self.schedule.get(target).await {
            Ok(Some(entry)) if !entry.is_due(now) => {
                let record = entry.to_record();
                self.timers.arm(target, entry.fire_at, record.remaining(now));
                self.records.insert(target, record);
                tracing::debug!(target_id = %target, "Approval restored from schedule");
                true
            },
            Ok(Some(_)) => {
                tracing::debug!(target_id = %target, "Clearing stale scheduled expiry");
                self.clear(target).await;
                false
            },
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(target_id = %target, error = %e, "Expiry schedule unreadable");
                false
            },
        }
    }

    /// Close `target`'s window because its fire time `fire_at` was reached.
    ///
    /// Returns `true` if a window was closed and the target should be
    /// re-gated. Stale notifications are ignored: if the window was
    /// released, or re-granted with a later fire time, nothing happens.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the durable entry cannot be read or removed.
    pub async fn expire(&mut self, target: TargetId, fire_at: Timestamp) -> ApprovalResult<bool> {
        if let Some(record) = self.records.get(&target)
            && record.expires_at() > fire_at
        {
            tracing::debug!(target_id = %target, "Ignoring superseded expiry");
            return Ok(false);
        }
        if let Some(entry) = self.schedule.get(target).await?
            && entry.fire_at > fire_at
        {
            tracing::debug!(target_id = %target, "Ignoring superseded scheduled expiry");
            return Ok(false);
        }

        let had_record = self.records.remove(&target).is_some();
        let had_entry = self.schedule.cancel(target).await?;
        self.timers.cancel(target);

        if had_record || had_entry {
            tracing::info!(target_id = %target, "Approval expired");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Forget `target` entirely, without an expiry notification.
    ///
    /// Used when the target closes or navigates away. Returns whether any
    /// state existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the durable entry cannot be removed. The
    /// in-memory state and timer are cleared regardless.
    pub async fn release(&mut self, target: TargetId) -> ApprovalResult<bool> {
        let was_pending = self.pending.remove(&target);
        let had_record = self.records.remove(&target).is_some();
        self.timers.cancel(target);
        let had_entry = self.schedule.cancel(target).await?;

        let existed = was_pending || had_record || had_entry;
        if existed {
            tracing::info!(target_id = %target, "Approval released");
        }
        Ok(existed)
    }

    /// Record that the barrier is showing on `target`.
    pub fn mark_pending(&mut self, target: TargetId) {
        self.pending.insert(target);
    }

    /// Whether the barrier is showing on `target`.
    #[must_use]
    pub fn is_pending(&self, target: TargetId) -> bool {
        self.pending.contains(&target)
    }

    /// Current state of `target`, from cached state only.
    #[must_use]
    pub fn state(&self, target: TargetId) -> TargetState {
        let now = self.clock.now();
        match self.records.get(&target) {
            Some(record) if record.is_live(now) => TargetState::Approved,
            _ if self.pending.contains(&target) => TargetState::PendingReview,
            _ => TargetState::Ungated,
        }
    }

    /// The cached record for `target`, live or not.
    #[must_use]
    pub fn record(&self, target: TargetId) -> Option<&ApprovalRecord> {
        self.records.get(&target)
    }

    /// Number of cached records.
    #[must_use]
    pub fn approved_count(&self) -> usize {
        self.records.len()
    }

    /// Load every open window from the durable schedule and arm its timer.
    ///
    /// Windows that closed while the process was down are left for
    /// [`ApprovalLedger::sweep`]. Returns the number of windows restored.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schedule cannot be listed.
    pub async fn rehydrate(&mut self) -> ApprovalResult<usize> {
        let now = self.clock.now();
        let mut restored = 0usize;
        for entry in self.schedule.all().await? {
            if entry.is_due(now) {
                continue;
            }
            let record = entry.to_record();
            self.timers.arm(entry.target, entry.fire_at, record.remaining(now));
            self.records.insert(entry.target, record);
            restored = restored.saturating_add(1);
        }
        tracing::info!(restored, "Approval ledger rehydrated");
        Ok(restored)
    }

    /// Expire every window whose fire time has passed.
    ///
    /// This is the authoritative expiry path: it works from the durable
    /// schedule alone, whether or not a fast-path timer fired. Returns one
    /// notification per window closed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schedule cannot be read.
    pub async fn sweep(&mut self) -> ApprovalResult<Vec<ExpiryFired>> {
        let now = self.clock.now();
        let mut expired = Vec::new();

        for entry in self.schedule.due(now).await? {
            if self.expire(entry.target, entry.fire_at).await? {
                expired.push(ExpiryFired {
                    target: entry.target,
                    fire_at: entry.fire_at,
                });
            }
        }

        // Cached windows whose durable entry is already gone.
        let orphans: Vec<ApprovalRecord> = self
            .records
            .values()
            .filter(|r| !r.is_live(now))
            .cloned()
            .collect();
        for record in orphans {
            if self.expire(record.target, record.expires_at()).await? {
                expired.push(ExpiryFired {
                    target: record.target,
                    fire_at: record.expires_at(),
                });
            }
        }

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "Sweep expired approvals");
        }
        Ok(expired)
    }

    /// Stop all fast-path timers. Durable entries stay for the next start.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
        tracing::debug!(cached = self.records.len(), "Approval ledger shut down");
    }

    async fn clear(&mut self, target: TargetId) {
        self.records.remove(&target);
        self.timers.cancel(target);
        if let Err(e) = self.schedule.cancel(target).await {
            tracing::warn!(target_id = %target, error = %e, "Failed to cancel scheduled expiry");
        }
    }
}

impl fmt::Debug for ApprovalLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalLedger")
            .field("records", &self.records.len())
            .field("pending", &self.pending.len())
            .field("timers", &self.timers.armed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
