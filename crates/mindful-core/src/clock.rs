//! Time sources.
//!
//! Gate logic asks a [`Clock`] for "now" instead of reading the system time,
//! so approval windows can be exercised in tests without sleeping.

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use crate::types::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use mindful_core::{Clock, ManualClock, Timestamp};
/// use std::time::Duration;
///
/// let clock = ManualClock::at(Timestamp::from_millis(0).unwrap());
/// clock.advance(Duration::from_secs(90));
/// assert_eq!(clock.now().as_millis(), 90_000);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a manual clock starting at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Timestamp::now())
    }

    /// Create a manual clock starting at `start`.
    #[must_use]
    pub fn at(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| {
            tracing::warn!("ManualClock lock poisoned, recovering");
            e.into_inner()
        });
        *now = now.saturating_add(by);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, to: Timestamp) {
        let mut now = self.now.write().unwrap_or_else(|e| {
            tracing::warn!("ManualClock lock poisoned, recovering");
            e.into_inner()
        });
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
