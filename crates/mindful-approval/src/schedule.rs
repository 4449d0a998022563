//! Durable expiry schedule.

use mindful_core::{TargetId, Timestamp};
use mindful_storage::{KvStore, ScopedKvStore, StorageResult};
use std::sync::Arc;

use crate::record::ScheduledExpiry;

/// Storage namespace holding the schedule.
pub const SCHEDULE_NAMESPACE: &str = "schedule";

/// Key prefix of one target's expiry entry.
pub const EXPIRY_KEY_PREFIX: &str = "expiry:";

/// One expiry entry per approved target, persisted under `expiry:{target}`.
///
/// Entries outlive the process. Whoever wakes up next can find every window
/// that closed while nobody was watching with [`ExpirySchedule::due`].
#[derive(Debug, Clone)]
pub struct ExpirySchedule {
    store: ScopedKvStore,
}

impl ExpirySchedule {
    /// Bind the schedule to the `schedule` namespace of `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is rejected by the store.
    pub fn new(store: Arc<dyn KvStore>) -> StorageResult<Self> {
        Ok(Self {
            store: ScopedKvStore::new(store, SCHEDULE_NAMESPACE)?,
        })
    }

    /// Key of `target`'s entry.
    #[must_use]
    pub fn key(target: TargetId) -> String {
        format!("{EXPIRY_KEY_PREFIX}{target}")
    }

    /// Write (or overwrite) the entry for `entry.target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn arm(&self, entry: &ScheduledExpiry) -> StorageResult<()> {
        self.store.set_json(&Self::key(entry.target), entry).await
    }

    /// Remove `target`'s entry. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub async fn cancel(&self, target: TargetId) -> StorageResult<bool> {
        self.store.delete(&Self::key(target)).await
    }

    /// Read `target`'s entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the entry is corrupt.
    pub async fn get(&self, target: TargetId) -> StorageResult<Option<ScheduledExpiry>> {
        self.store.get_json(&Self::key(target)).await
    }

    /// Every entry, ordered by fire time. Corrupt entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing fails.
    pub async fn all(&self) -> StorageResult<Vec<ScheduledExpiry>> {
        let mut entries = Vec::new();
        for key in self.store.list_keys().await? {
            if !key.starts_with(EXPIRY_KEY_PREFIX) {
                continue;
            }
            match self.store.get_json::<ScheduledExpiry>(&key).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {},
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Dropping unreadable expiry entry");
                    if let Err(e) = self.store.delete(&key).await {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "Failed to delete unreadable expiry entry"
                        );
                    }
                },
            }
        }
        entries.sort_by_key(|e| e.fire_at);
        Ok(entries)
    }

    /// Entries whose fire time is at or before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing fails.
    pub async fn due(&self, now: Timestamp) -> StorageResult<Vec<ScheduledExpiry>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|e| e.is_due(now))
            .collect())
    }
}
