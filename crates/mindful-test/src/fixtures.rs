//! Ready-made gate setups.

use std::sync::{Arc, Once};

use mindful_approval::{ApprovalLedger, ExpiryFired, ExpirySchedule, ExpiryTimers};
use mindful_core::{Clock, ManualClock, Timestamp};
use mindful_gate::{GateController, SettingsStore};
use mindful_reason::ReasonValidator;
use mindful_storage::{KvStore, MemoryKvStore};
use tokio::sync::mpsc;

use crate::mocks::RecordingUi;

/// A reason every default validator accepts.
pub const VALID_REASON: &str = "I need to check the event schedule for my team meeting tomorrow";

/// Fixed start time of [`TestGate`] clocks (2024-01-01T00:00:00Z).
pub const TEST_EPOCH_MS: i64 = 1_704_067_200_000;

static LOGGING: Once = Once::new();

/// Install a test subscriber once per process, honouring `RUST_LOG`.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A controller over in-memory storage with a manual clock and a
/// recording UI.
pub struct TestGate {
    /// Drives "now" for the ledger.
    pub clock: Arc<ManualClock>,
    /// Backing store shared by settings and schedule.
    pub store: Arc<dyn KvStore>,
    /// Records everything sent to tabs.
    pub ui: RecordingUi,
    /// The controller under test.
    pub controller: GateController,
    /// Fast-path timer notifications.
    pub expiries: mpsc::UnboundedReceiver<ExpiryFired>,
}

impl TestGate {
    /// A gate with empty settings (gate off, default blocklist).
    #[must_use]
    pub fn new() -> Self {
        Self::over(Arc::new(MemoryKvStore::new()), Arc::new(ManualClock::at(epoch())))
    }

    /// A gate with first-run defaults applied (gate on).
    ///
    /// # Panics
    ///
    /// Panics if seeding the in-memory store fails.
    #[allow(clippy::expect_used)]
    pub async fn enabled() -> Self {
        let gate = Self::new();
        gate.settings()
            .initialize_defaults()
            .await
            .expect("seed defaults");
        gate
    }

    /// A gate over an existing store and clock, as after a restart.
    ///
    /// # Panics
    ///
    /// Panics if the store rejects the fixed namespaces.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn over(store: Arc<dyn KvStore>, clock: Arc<ManualClock>) -> Self {
        let schedule = ExpirySchedule::new(Arc::clone(&store)).expect("schedule namespace");
        let settings = SettingsStore::new(Arc::clone(&store)).expect("settings namespace");
        let (timers, expiries) = ExpiryTimers::channel();
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let ledger = ApprovalLedger::new(dyn_clock, schedule, timers);
        let ui = RecordingUi::new();
        let controller = GateController::new(
            ledger,
            settings,
            ReasonValidator::default(),
            Arc::new(ui.clone()),
        );
        Self {
            clock,
            store,
            ui,
            controller,
            expiries,
        }
    }

    /// The controller's settings store.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        self.controller.settings()
    }
}

impl Default for TestGate {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch() -> Timestamp {
    Timestamp::from_millis(TEST_EPOCH_MS).unwrap_or_default()
}
