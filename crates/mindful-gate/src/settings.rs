//! The gate's configuration store.
//!
//! Settings live in the `settings` namespace of a [`KvStore`] as JSON values
//! under the keys the browser extension uses: `blockedSites`, `enabled`,
//! `timerMinutes` and `reasonHistory`.

use async_trait::async_trait;
use mindful_core::Timestamp;
use mindful_storage::{KvStore, ScopedKvStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{GateError, GateResult};
use crate::site::{is_valid_domain, normalize_site};

/// Storage namespace holding the settings.
pub const SETTINGS_NAMESPACE: &str = "settings";

/// Key of the ordered blocklist.
pub const KEY_BLOCKED_SITES: &str = "blockedSites";
/// Key of the on/off toggle.
pub const KEY_ENABLED: &str = "enabled";
/// Key of the approval window length in minutes.
pub const KEY_TIMER_MINUTES: &str = "timerMinutes";
/// Key of the reason history.
pub const KEY_REASON_HISTORY: &str = "reasonHistory";

/// Maximum number of history entries kept.
pub const HISTORY_CAP: usize = 20;

/// Approval window length when none is configured.
pub const DEFAULT_TIMER_MINUTES: u32 = 5;

/// Window of the history summary.
pub const RECENT_HISTORY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Blocklist seeded on first run.
pub const DEFAULT_BLOCKED_SITES: &[&str] = &[
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "reddit.com",
];

/// A snapshot of the gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether the gate is active.
    pub enabled: bool,
    /// Ordered blocklist entries.
    pub blocked_sites: Vec<String>,
    /// Approval window length in minutes.
    pub timer_minutes: u32,
}

impl Settings {
    /// The settings used when the store cannot be read: the gate is off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            blocked_sites: Vec::new(),
            timer_minutes: DEFAULT_TIMER_MINUTES,
        }
    }

    /// Approval window length.
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.timer_minutes).saturating_mul(60))
    }

    /// Approval window length in milliseconds.
    #[must_use]
    pub fn window_ms(&self) -> u64 {
        u64::from(self.timer_minutes).saturating_mul(60_000)
    }
}

/// One accepted justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The reason as typed.
    pub reason: String,
    /// Site it was given for.
    pub site: String,
    /// When it was accepted.
    pub timestamp: Timestamp,
}

/// History entries for one site, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryGroup {
    /// The site.
    pub site: String,
    /// Entries, newest first.
    pub entries: Vec<HistoryEntry>,
}

impl HistoryGroup {
    /// Time of the newest entry.
    #[must_use]
    pub fn latest(&self) -> Option<Timestamp> {
        self.entries.first().map(|e| e.timestamp)
    }
}

/// Result of adding a site to the blocklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddSiteOutcome {
    /// Added under the normalized name.
    Added(String),
    /// Nothing left after normalization.
    Empty,
    /// Not a domain.
    Invalid(String),
    /// Already on the list.
    Duplicate(String),
    /// The host refused access to the site.
    PermissionDenied(String),
}

/// Host capability to act on a site's pages.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Ask for access to `origin` (`*://*.{site}/*`). Returns whether granted.
    async fn request(&self, origin: &str) -> bool;

    /// Give up access to `origin`.
    async fn revoke(&self, origin: &str);
}

/// Permission gate that grants everything. Used when the daemon itself
/// edits the blocklist and no browser prompt exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionGate for AllowAllPermissions {
    async fn request(&self, _origin: &str) -> bool {
        true
    }

    async fn revoke(&self, _origin: &str) {}
}

/// Origin pattern covering `site` and its subdomains.
#[must_use]
pub fn origin_pattern(site: &str) -> String {
    format!("*://*.{site}/*")
}

/// Typed access to the settings namespace.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    store: ScopedKvStore,
}

impl SettingsStore {
    /// Bind to the `settings` namespace of `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is rejected by the store.
    pub fn new(store: Arc<dyn KvStore>) -> StorageResult<Self> {
        Ok(Self {
            store: ScopedKvStore::new(store, SETTINGS_NAMESPACE)?,
        })
    }

    /// Read the current settings.
    ///
    /// Never fails: if the store cannot be read the gate is reported as
    /// disabled, so a broken store never traps the user.
    pub async fn load(&self) -> Settings {
        match self.try_load().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Settings unreadable, gate disabled");
                Settings::disabled()
            },
        }
    }

    /// Read the current settings, surfacing storage errors.
    ///
    /// Absent keys take their defaults: disabled, the default blocklist and
    /// a five-minute window.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be read or decoded.
    pub async fn try_load(&self) -> GateResult<Settings> {
        let enabled = self.store.get_json::<bool>(KEY_ENABLED).await?;
        let blocked_sites = self
            .store
            .get_json::<Vec<String>>(KEY_BLOCKED_SITES)
            .await?;
        let timer_minutes = self.store.get_json::<u32>(KEY_TIMER_MINUTES).await?;

        Ok(Settings {
            enabled: enabled.unwrap_or(false),
            blocked_sites: blocked_sites.unwrap_or_else(default_sites),
            timer_minutes: timer_minutes
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_TIMER_MINUTES),
        })
    }

    /// Seed first-run values. Existing values are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn initialize_defaults(&self) -> GateResult<()> {
        if self.store.get(KEY_BLOCKED_SITES).await?.is_none() {
            self.store
                .set_json(KEY_BLOCKED_SITES, &default_sites())
                .await?;
            tracing::info!("Seeded default blocklist");
        }
        if self.store.get(KEY_ENABLED).await?.is_none() {
            self.store.set_json(KEY_ENABLED, &true).await?;
        }
        Ok(())
    }

    /// Turn the gate on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn set_enabled(&self, enabled: bool) -> GateResult<()> {
        self.store.set_json(KEY_ENABLED, &enabled).await?;
        tracing::info!(enabled, "Gate toggled");
        Ok(())
    }

    /// Set the approval window length.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidSetting`] for zero minutes, or a storage
    /// error if the write fails.
    pub async fn set_timer_minutes(&self, minutes: u32) -> GateResult<()> {
        if minutes == 0 {
            return Err(GateError::InvalidSetting(
                "timerMinutes must be at least 1".to_string(),
            ));
        }
        self.store.set_json(KEY_TIMER_MINUTES, &minutes).await?;
        Ok(())
    }

    /// The blocklist, or the default one if none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be read or decoded.
    pub async fn blocked_sites(&self) -> GateResult<Vec<String>> {
        Ok(self
            .store
            .get_json::<Vec<String>>(KEY_BLOCKED_SITES)
            .await?
            .unwrap_or_else(default_sites))
    }

    /// Normalize and validate `raw`, ask `permissions` for access, then
    /// append it to the blocklist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written. Rejected
    /// input is reported through [`AddSiteOutcome`], not as an error.
    pub async fn add_site(
        &self,
        raw: &str,
        permissions: &dyn PermissionGate,
    ) -> GateResult<AddSiteOutcome> {
        let site = normalize_site(raw);
        if site.is_empty() {
            return Ok(AddSiteOutcome::Empty);
        }
        if !is_valid_domain(&site) {
            return Ok(AddSiteOutcome::Invalid(site));
        }

        let mut sites = self.blocked_sites().await?;
        if sites.contains(&site) {
            return Ok(AddSiteOutcome::Duplicate(site));
        }
        if !permissions.request(&origin_pattern(&site)).await {
            tracing::info!(site = %site, "Permission denied for site");
            return Ok(AddSiteOutcome::PermissionDenied(site));
        }

        sites.push(site.clone());
        self.store.set_json(KEY_BLOCKED_SITES, &sites).await?;
        tracing::info!(site = %site, "Site added to blocklist");
        Ok(AddSiteOutcome::Added(site))
    }

    /// Remove `site` from the blocklist and give up access to it. Returns
    /// whether it was listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn remove_site(
        &self,
        site: &str,
        permissions: &dyn PermissionGate,
    ) -> GateResult<bool> {
        let mut sites = self.blocked_sites().await?;
        let before = sites.len();
        sites.retain(|s| s != site);
        if sites.len() == before {
            return Ok(false);
        }

        self.store.set_json(KEY_BLOCKED_SITES, &sites).await?;
        permissions.revoke(&origin_pattern(site)).await;
        tracing::info!(site = %site, "Site removed from blocklist");
        Ok(true)
    }

    /// The stored history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be read or decoded.
    pub async fn history(&self) -> GateResult<Vec<HistoryEntry>> {
        Ok(self
            .store
            .get_json::<Vec<HistoryEntry>>(KEY_REASON_HISTORY)
            .await?
            .unwrap_or_default())
    }

    /// Append `entry`, evicting the oldest entries beyond [`HISTORY_CAP`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn append_history(&self, entry: HistoryEntry) -> GateResult<()> {
        let mut history = self.history().await?;
        history.push(entry);
        let overflow = history.len().saturating_sub(HISTORY_CAP);
        history.drain(..overflow);
        self.store.set_json(KEY_REASON_HISTORY, &history).await?;
        Ok(())
    }

    /// Entries newer than `now - window`, grouped by site.
    ///
    /// Groups are ordered by their newest entry, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    pub async fn recent_history(
        &self,
        now: Timestamp,
        window: Duration,
    ) -> GateResult<Vec<HistoryGroup>> {
        let cutoff = now.saturating_sub(window);
        let mut by_site: HashMap<String, Vec<HistoryEntry>> = HashMap::new();
        for entry in self.history().await? {
            if entry.timestamp >= cutoff {
                by_site.entry(entry.site.clone()).or_default().push(entry);
            }
        }

        let mut groups: Vec<HistoryGroup> = by_site
            .into_iter()
            .map(|(site, mut entries)| {
                entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                HistoryGroup { site, entries }
            })
            .collect();
        groups.sort_by(|a, b| b.latest().cmp(&a.latest()).then_with(|| a.site.cmp(&b.site)));
        Ok(groups)
    }
}

fn default_sites() -> Vec<String> {
    DEFAULT_BLOCKED_SITES
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

/// Coarse age of `then` relative to `now`: `just now`, `5m ago`, `3h ago`,
/// `2d ago`.
#[must_use]
pub fn relative_time(now: Timestamp, then: Timestamp) -> String {
    let minutes = now.duration_since(then).as_secs() / 60;
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
