//! Approval records and their durable counterpart.

use mindful_core::{TargetId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Gate state of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetState {
    /// No barrier and no approval.
    Ungated,
    /// Barrier shown, waiting for an acceptable reason.
    PendingReview,
    /// Inside an approval window.
    Approved,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ungated => write!(f, "ungated"),
            Self::PendingReview => write!(f, "pending_review"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

/// A granted approval window for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    /// The approved target.
    pub target: TargetId,
    /// When the window opened.
    pub granted_at: Timestamp,
    /// Window length in milliseconds.
    pub duration_ms: u64,
    /// Blocklist entry the approval was granted for, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl ApprovalRecord {
    /// Create a record opening at `granted_at`.
    #[must_use]
    pub fn new(
        target: TargetId,
        granted_at: Timestamp,
        duration: Duration,
        site: Option<String>,
    ) -> Self {
        Self {
            target,
            granted_at,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            site,
        }
    }

    /// Window length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// When the window closes.
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.granted_at.saturating_add(self.duration())
    }

    /// Whether `now - granted_at < duration`.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.expires_at().is_reached(now)
    }

    /// Time left in the window, zero once it has closed.
    #[must_use]
    pub fn remaining(&self, now: Timestamp) -> Duration {
        self.expires_at().duration_since(now)
    }

    /// The durable entry paired with this record.
    #[must_use]
    pub fn to_schedule(&self) -> ScheduledExpiry {
        ScheduledExpiry {
            target: self.target,
            fire_at: self.expires_at(),
            granted_at: self.granted_at,
            site: self.site.clone(),
        }
    }
}

/// Durable expiry entry. Carries enough to rebuild the [`ApprovalRecord`]
/// after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledExpiry {
    /// Target the expiry belongs to.
    pub target: TargetId,
    /// When the approval window closes.
    pub fire_at: Timestamp,
    /// When the approval window opened.
    pub granted_at: Timestamp,
    /// Blocklist entry the approval was granted for, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl ScheduledExpiry {
    /// Whether the fire time has been reached.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.fire_at.is_reached(now)
    }

    /// Rebuild the in-memory record.
    #[must_use]
    pub fn to_record(&self) -> ApprovalRecord {
        ApprovalRecord::new(
            self.target,
            self.granted_at,
            self.fire_at.duration_since(self.granted_at),
            self.site.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> Timestamp {
        Timestamp::from_millis(millis).unwrap()
    }

    #[test]
    fn test_record_window() {
        let record = ApprovalRecord::new(
            TargetId::new(7),
            at(1_000_000),
            Duration::from_secs(300),
            Some("reddit.com".into()),
        );
        assert_eq!(record.duration_ms, 300_000);
        assert_eq!(record.expires_at(), at(1_300_000));

        assert!(record.is_live(at(1_000_000)));
        assert!(record.is_live(at(1_299_999)));
        assert!(!record.is_live(at(1_300_000)));

        assert_eq!(record.remaining(at(1_100_000)), Duration::from_secs(200));
        assert_eq!(record.remaining(at(2_000_000)), Duration::ZERO);
    }

    #[test]
    fn test_schedule_round_trip_keeps_window() {
        let record = ApprovalRecord::new(TargetId::new(3), at(5_000), Duration::from_secs(60), None);
        let entry = record.to_schedule();
        assert_eq!(entry.fire_at, at(65_000));
        assert!(!entry.is_due(at(64_999)));
        assert!(entry.is_due(at(65_000)));
        assert_eq!(entry.to_record(), record);
    }

    #[test]
    fn test_schedule_json_shape() {
        let entry = ScheduledExpiry {
            target: TargetId::new(42),
            fire_at: at(65_000),
            granted_at: at(5_000),
            site: Some("x.com".into()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["target"], 42);
        assert_eq!(json["site"], "x.com");
        assert!(json.get("fireAt").is_some());
        assert!(json.get("grantedAt").is_some());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TargetState::PendingReview.to_string(), "pending_review");
        assert_eq!(
            serde_json::to_value(TargetState::PendingReview).unwrap(),
            "PENDING_REVIEW"
        );
    }
}
