//! The gate controller.
//!
//! The controller owns the [`ApprovalLedger`] and handles one event at a
//! time: navigation reports and submissions from the UI, expiry
//! notifications from the fast-path timers, and periodic sweeps of the
//! durable schedule.
//!
//! # Flow
//!
//! 1. A tab reports a URL; if the gate is on, the site is blocked and the
//!    tab has no open window, the UI is told to show the barrier
//! 2. The UI submits a reason; it is validated again here, and on success
//!    a window is granted, the reason is logged to history and the UI is
//!    told to start its countdown
//! 3. When the window closes the UI is told the time is up and the tab
//!    goes back to pending review
//! 4. Declining closes the tab; a closed tab is released

use async_trait::async_trait;
use mindful_approval::{ApprovalLedger, ApprovalRecord, ExpiryFired, TargetState};
use mindful_core::TargetId;
use mindful_reason::ReasonValidator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{GateError, GateResult};
use crate::protocol::{InboundFrame, InboundMessage, OutboundMessage};
use crate::settings::{HistoryEntry, SettingsStore};
use crate::site;

/// Shown on the barrier when an accepted reason could not be recorded.
pub const GRANT_FAILED_MESSAGE: &str = "Could not save your approval, please try again";

/// Capacity of the controller inbox.
pub const INBOX_CAPACITY: usize = 256;

/// Delivers messages to the barrier UI of one tab.
///
/// Implementations must return [`GateError::Unreachable`] (or any error)
/// when the tab's UI is gone; the controller then releases the tab.
#[async_trait]
pub trait BarrierUi: Send + Sync {
    /// Send `message` to `target`'s UI.
    async fn send(&self, target: TargetId, message: OutboundMessage) -> GateResult<()>;
}

/// Input to the controller loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// A message from a tab's UI.
    Inbound(InboundFrame),
    /// A fast-path timer fired.
    Expired(ExpiryFired),
    /// Check the durable schedule for closed windows.
    Sweep,
}

impl From<InboundFrame> for GateEvent {
    fn from(frame: InboundFrame) -> Self {
        Self::Inbound(frame)
    }
}

/// What a navigation report led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// The gate is off.
    Disabled,
    /// The URL is not on the blocklist.
    NotBlocked,
    /// Inside an open window; passed through.
    Approved,
    /// The barrier was shown.
    Barrier,
    /// The barrier could not be delivered; the tab was released.
    Unreachable,
}

/// What a submitted reason led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted; a window is open.
    Granted(ApprovalRecord),
    /// Not accepted; the barrier stays open with these messages.
    Rejected(Vec<String>),
    /// The UI went away while answering; the tab was released.
    Unreachable,
}

/// Orchestrates matching, validation and the ledger for every event.
pub struct GateController {
    ledger: ApprovalLedger,
    settings: SettingsStore,
    validator: ReasonValidator,
    ui: Arc<dyn BarrierUi>,
}

impl GateController {
    /// Create a controller.
    #[must_use]
    pub fn new(
        ledger: ApprovalLedger,
        settings: SettingsStore,
        validator: ReasonValidator,
        ui: Arc<dyn BarrierUi>,
    ) -> Self {
        Self {
            ledger,
            settings,
            validator,
            ui,
        }
    }

    /// The approval ledger.
    #[must_use]
    pub fn ledger(&self) -> &ApprovalLedger {
        &self.ledger
    }

    /// Mutable access to the approval ledger.
    pub fn ledger_mut(&mut self) -> &mut ApprovalLedger {
        &mut self.ledger
    }

    /// The settings store.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Gate state of `target`.
    #[must_use]
    pub fn state(&self, target: TargetId) -> TargetState {
        self.ledger.state(target)
    }

    /// Handle one event. Failures are logged; nothing here stops the loop.
    pub async fn handle(&mut self, event: GateEvent) {
        let result = match event {
            GateEvent::Inbound(frame) => self.handle_inbound(frame).await,
            GateEvent::Expired(fired) => self.on_expired(fired).await.map(|_| ()),
            GateEvent::Sweep => self.sweep().await.map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Gate event failed");
        }
    }

    async fn handle_inbound(&mut self, frame: InboundFrame) -> GateResult<()> {
        let target = frame.tab_id;
        match frame.message {
            InboundMessage::NavigationCompleted { url } => {
                self.on_navigation(target, &url).await?;
            },
            InboundMessage::BarrierApproved { reason, site } => {
                self.on_submission(target, &reason, &site).await?;
            },
            InboundMessage::CloseTab => self.on_close_requested(target).await?,
            InboundMessage::TabClosed => self.on_target_closed(target).await?,
        }
        Ok(())
    }

    /// A tab finished loading `url` or was activated.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger's durable schedule cannot be updated.
    pub async fn on_navigation(
        &mut self,
        target: TargetId,
        url: &str,
    ) -> GateResult<NavigationDecision> {
        let settings = self.settings.load().await;
        if !settings.enabled {
            tracing::debug!(target_id = %target, "Gate disabled");
            return Ok(NavigationDecision::Disabled);
        }

        let Some(entry) = site::matched_entry(url, &settings.blocked_sites) else {
            if self.ledger.record(target).is_some() || self.ledger.is_pending(target) {
                tracing::debug!(target_id = %target, "Navigated off blocked site");
                self.ledger.release(target).await?;
            }
            return Ok(NavigationDecision::NotBlocked);
        };
        let entry = entry.to_owned();

        if self.ledger.is_approved(target).await {
            let same_site = self
                .ledger
                .record(target)
                .and_then(|r| r.site.as_deref())
                .is_none_or(|granted| granted == entry);
            if same_site {
                tracing::debug!(target_id = %target, site = %entry, "Inside approval window");
                return Ok(NavigationDecision::Approved);
            }
            tracing::debug!(target_id = %target, site = %entry, "Moved to another blocked site");
            self.ledger.release(target).await?;
        }

        self.ledger.mark_pending(target);
        let message = OutboundMessage::ShowBarrier {
            url: url.to_owned(),
            site: site::display_name(url).unwrap_or_else(|| entry.clone()),
            min_chars: self.validator.config().min_chars,
        };
        tracing::debug!(target_id = %target, site = %entry, "Showing barrier");
        if self.deliver(target, message).await {
            Ok(NavigationDecision::Barrier)
        } else {
            Ok(NavigationDecision::Unreachable)
        }
    }

    /// A reason was submitted for `site`.
    ///
    /// # Errors
    ///
    /// Returns an error if the window could not be recorded. The UI has
    /// already been told to keep the barrier open.
    pub async fn on_submission(
        &mut self,
        target: TargetId,
        reason: &str,
        site: &str,
    ) -> GateResult<SubmissionOutcome> {
        let verdict = self.validator.validate(reason);
        if !verdict.valid {
            tracing::debug!(target_id = %target, rejection = ?verdict.rejection, "Reason rejected");
            self.ledger.mark_pending(target);
            let message = OutboundMessage::BarrierRejected {
                errors: verdict.errors.clone(),
            };
            if !self.deliver(target, message).await {
                return Ok(SubmissionOutcome::Unreachable);
            }
            return Ok(SubmissionOutcome::Rejected(verdict.errors));
        }

        let settings = self.settings.load().await;
        let entry =
            site::matched_entry_for_host(site, &settings.blocked_sites).map(str::to_owned);
        let record = match self.ledger.grant(target, settings.window(), entry).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(target_id = %target, error = %e, "Failed to record approval");
                let message = OutboundMessage::BarrierRejected {
                    errors: vec![GRANT_FAILED_MESSAGE.to_owned()],
                };
                self.deliver(target, message).await;
                return Err(e.into());
            },
        };

        let entry = HistoryEntry {
            reason: reason.trim().to_owned(),
            site: site.to_owned(),
            timestamp: record.granted_at,
        };
        if let Err(e) = self.settings.append_history(entry).await {
            tracing::warn!(target_id = %target, error = %e, "Failed to append reason history");
        }

        let message = OutboundMessage::StartTimer {
            duration_ms: record.duration_ms,
            timer_minutes: settings.timer_minutes,
        };
        if !self.deliver(target, message).await {
            return Ok(SubmissionOutcome::Unreachable);
        }
        Ok(SubmissionOutcome::Granted(record))
    }

    /// A fast-path timer fired. Returns whether a window was closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable schedule cannot be updated.
    pub async fn on_expired(&mut self, fired: ExpiryFired) -> GateResult<bool> {
        if !self.ledger.expire(fired.target, fired.fire_at).await? {
            return Ok(false);
        }
        self.notify_expired(fired.target).await;
        Ok(true)
    }

    /// Expire every window the durable schedule says has closed. Returns
    /// how many were closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable schedule cannot be read.
    pub async fn sweep(&mut self) -> GateResult<usize> {
        let expired = self.ledger.sweep().await?;
        for fired in &expired {
            self.notify_expired(fired.target).await;
        }
        Ok(expired.len())
    }

    /// The user declined to give a reason: forget the tab and ask for it
    /// to be closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable schedule cannot be updated.
    pub async fn on_close_requested(&mut self, target: TargetId) -> GateResult<()> {
        self.ledger.release(target).await?;
        if let Err(e) = self.ui.send(target, OutboundMessage::CloseTarget).await {
            tracing::warn!(target_id = %target, error = %e, "Could not request tab close");
        }
        Ok(())
    }

    /// The tab is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable schedule cannot be updated.
    pub async fn on_target_closed(&mut self, target: TargetId) -> GateResult<()> {
        self.ledger.release(target).await?;
        Ok(())
    }

    async fn notify_expired(&mut self, target: TargetId) {
        self.ledger.mark_pending(target);
        self.deliver(target, OutboundMessage::TimeExpired).await;
    }

    /// Send to `target`; a gone destination releases the target.
    async fn deliver(&mut self, target: TargetId, message: OutboundMessage) -> bool {
        match self.ui.send(target, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target_id = %target, error = %e, "UI unreachable, releasing target");
                if let Err(e) = self.ledger.release(target).await {
                    tracing::warn!(target_id = %target, error = %e, "Release failed");
                }
                false
            },
        }
    }

    /// Run the controller on its own task.
    ///
    /// `expiries` is the receiver paired with the ledger's timers. The
    /// durable schedule is swept every `sweep_interval`, starting
    /// immediately. The loop ends when `shutdown` is cancelled or every
    /// [`GateHandle`] sender is dropped.
    #[must_use]
    pub fn spawn(
        self,
        expiries: mpsc::UnboundedReceiver<ExpiryFired>,
        sweep_interval: Duration,
        shutdown: CancellationToken,
    ) -> GateHandle {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let task = tokio::spawn(self.run(inbox, expiries, sweep_interval, shutdown));
        GateHandle { tx, task }
    }

    /// The controller loop. See [`GateController::spawn`].
    pub async fn run(
        mut self,
        mut inbox: mpsc::Receiver<GateEvent>,
        mut expiries: mpsc::UnboundedReceiver<ExpiryFired>,
        sweep_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let sweep_interval = sweep_interval.max(Duration::from_millis(1));
        let mut sweep = tokio::time::interval(sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(sweep_interval_ms = sweep_interval.as_millis(), "Gate controller started");

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break,
                event = inbox.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                Some(fired) = expiries.recv() => self.handle(GateEvent::Expired(fired)).await,
                _ = sweep.tick() => self.handle(GateEvent::Sweep).await,
            }
        }

        self.ledger.shutdown();
        tracing::info!("Gate controller stopped");
    }
}

impl std::fmt::Debug for GateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateController")
            .field("ledger", &self.ledger)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Handle to a running controller.
#[derive(Debug)]
pub struct GateHandle {
    tx: mpsc::Sender<GateEvent>,
    task: JoinHandle<()>,
}

impl GateHandle {
    /// Queue an event.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::ControllerStopped`] if the loop has ended.
    pub async fn send(&self, event: impl Into<GateEvent>) -> GateResult<()> {
        self.tx
            .send(event.into())
            .await
            .map_err(|_| GateError::ControllerStopped)
    }

    /// A sender for the controller inbox.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<GateEvent> {
        self.tx.clone()
    }

    /// Close the inbox and wait for the loop to finish.
    pub async fn join(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Gate controller task failed");
        }
    }
}
