//! Configuration types for the mindful daemon.
//!
//! These types stand alone with no dependency on the other mindful crates.
//! Validator thresholds are mirrored here and converted to the domain type
//! by the binary. Every struct implements [`Default`] with the same values
//! as `defaults.toml`, so a bare `[section]` header still works.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the extension bridge listens.
    pub server: ServerSection,
    /// Which store backs settings and schedules.
    pub storage: StorageSection,
    /// Durable schedule sweeping.
    pub scheduler: SchedulerSection,
    /// Reason validator thresholds.
    pub validator: ValidatorSection,
    /// Logging.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ServerSection
// ---------------------------------------------------------------------------

/// WebSocket listener for the browser extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address.
    pub bind: String,
    /// TCP port.
    pub port: u16,
}

impl ServerSection {
    /// `bind:port`, ready for a socket listener.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_owned(),
            port: 9071,
        }
    }
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Store implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process map; nothing survives a restart.
    Memory,
    /// Embedded SurrealKV database.
    #[default]
    Surrealkv,
}

/// Persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Store implementation.
    pub backend: StorageBackend,
    /// Data directory for persistent backends. `None` means
    /// `~/.mindful/data`.
    pub data_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// SchedulerSection
// ---------------------------------------------------------------------------

/// Durable schedule sweeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// How often the durable schedule is checked for closed windows, in
    /// milliseconds.
    pub sweep_interval_ms: u64,
}

impl SchedulerSection {
    /// The sweep interval as a [`Duration`].
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// ValidatorSection
// ---------------------------------------------------------------------------

/// Reason validator thresholds. See the `mindful-reason` crate for what
/// each one controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ValidatorSection {
    pub min_chars: usize,
    pub max_char_run: usize,
    pub max_char_share: f64,
    pub non_latin_share: f64,
    pub word_repeat_count: usize,
    pub word_repeat_share: f64,
    pub mash_window: usize,
    pub mash_share: f64,
    pub long_word_len: usize,
    pub consonant_run: usize,
    pub bad_word_share: f64,
    pub diversity_min_words: usize,
    pub min_diversity: f64,
}

impl Default for ValidatorSection {
    fn default() -> Self {
        Self {
            min_chars: 30,
            max_char_run: 4,
            max_char_share: 0.4,
            non_latin_share: 0.5,
            word_repeat_count: 3,
            word_repeat_share: 0.3,
            mash_window: 5,
            mash_share: 0.3,
            long_word_len: 4,
            consonant_run: 5,
            bad_word_share: 0.5,
            diversity_min_words: 5,
            min_diversity: 0.4,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate directives (e.g. `["mindful_gate=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
