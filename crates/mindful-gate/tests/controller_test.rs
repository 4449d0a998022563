//! End-to-end tests of the gate controller over in-memory storage.

use std::time::Duration;

use mindful_approval::{ExpirySchedule, TargetState};
use mindful_core::TargetId;
use mindful_gate::{
    GateEvent, InboundFrame, InboundMessage, NavigationDecision, OutboundMessage,
    SubmissionOutcome,
};
use mindful_test::{TestGate, VALID_REASON, init_test_logging};
use tokio_util::sync::CancellationToken;

const TAB: TargetId = TargetId::new(17);
const REDDIT: &str = "https://www.reddit.com/r/rust";

async fn gated_and_approved() -> TestGate {
    let mut gate = TestGate::enabled().await;
    gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    let outcome = gate
        .controller
        .on_submission(TAB, VALID_REASON, "reddit.com")
        .await
        .unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Granted(_)));
    gate.ui.take();
    gate
}

#[tokio::test]
async fn test_disabled_gate_passes_everything() {
    init_test_logging();
    let mut gate = TestGate::new();
    let decision = gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Disabled);
    assert!(gate.ui.sent().is_empty());
}

#[tokio::test]
async fn test_unblocked_site_passes() {
    let mut gate = TestGate::enabled().await;
    let decision = gate
        .controller
        .on_navigation(TAB, "https://docs.rs/tokio")
        .await
        .unwrap();
    assert_eq!(decision, NavigationDecision::NotBlocked);
    assert!(gate.ui.sent().is_empty());
    assert_eq!(gate.controller.state(TAB), TargetState::Ungated);
}

#[tokio::test]
async fn test_blocked_site_shows_barrier() {
    let mut gate = TestGate::enabled().await;
    let decision = gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Barrier);
    assert_eq!(
        gate.ui.messages_for(TAB),
        vec![OutboundMessage::ShowBarrier {
            url: REDDIT.to_string(),
            site: "reddit.com".to_string(),
            min_chars: 30,
        }]
    );
    assert_eq!(gate.controller.state(TAB), TargetState::PendingReview);
}

#[tokio::test]
async fn test_rejected_reason_keeps_barrier() {
    let mut gate = TestGate::enabled().await;
    gate.controller.on_navigation(TAB, REDDIT).await.unwrap();

    let outcome = gate
        .controller
        .on_submission(TAB, "qwertqwertqwertqwertqwertqwert", "reddit.com")
        .await
        .unwrap();
    let errors = match outcome {
        SubmissionOutcome::Rejected(errors) => errors,
        other => panic!("expected rejection, got {other:?}"),
    };
    assert_eq!(
        errors,
        vec!["That looks like keyboard mashing, not a real reason"]
    );
    assert_eq!(
        gate.ui.last_for(TAB),
        Some(OutboundMessage::BarrierRejected { errors })
    );
    assert_eq!(gate.controller.state(TAB), TargetState::PendingReview);
    assert!(gate.settings().history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_accepted_reason_grants_window() {
    let mut gate = TestGate::enabled().await;
    gate.controller.on_navigation(TAB, REDDIT).await.unwrap();

    let outcome = gate
        .controller
        .on_submission(TAB, &format!("  {VALID_REASON}  "), "reddit.com")
        .await
        .unwrap();
    let record = match outcome {
        SubmissionOutcome::Granted(record) => record,
        other => panic!("expected grant, got {other:?}"),
    };
    assert_eq!(record.duration_ms, 300_000);
    assert_eq!(record.site.as_deref(), Some("reddit.com"));
    assert_eq!(
        gate.ui.last_for(TAB),
        Some(OutboundMessage::StartTimer {
            duration_ms: 300_000,
            timer_minutes: 5,
        })
    );
    assert_eq!(gate.controller.state(TAB), TargetState::Approved);

    let history = gate.settings().history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, VALID_REASON);
    assert_eq!(history[0].site, "reddit.com");

    // Reloads inside the window pass silently.
    let decision = gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Approved);
    assert_eq!(gate.ui.messages_for(TAB).len(), 2);
}

#[tokio::test]
async fn test_configured_window_length() {
    let mut gate = TestGate::enabled().await;
    gate.settings().set_timer_minutes(1).await.unwrap();
    gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    gate.controller
        .on_submission(TAB, VALID_REASON, "reddit.com")
        .await
        .unwrap();
    assert_eq!(
        gate.ui.last_for(TAB),
        Some(OutboundMessage::StartTimer {
            duration_ms: 60_000,
            timer_minutes: 1,
        })
    );
}

#[tokio::test]
async fn test_window_elapsed_regates_on_navigation() {
    let mut gate = gated_and_approved().await;
    gate.clock.advance(Duration::from_secs(301));

    let decision = gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Barrier);
}

#[tokio::test]
async fn test_sweep_sends_time_expired_then_rejustify() {
    let mut gate = gated_and_approved().await;
    gate.clock.advance(Duration::from_secs(301));

    assert_eq!(gate.controller.sweep().await.unwrap(), 1);
    assert_eq!(
        gate.ui.messages_for(TAB),
        vec![OutboundMessage::TimeExpired]
    );
    assert_eq!(gate.controller.state(TAB), TargetState::PendingReview);

    let outcome = gate
        .controller
        .on_submission(TAB, VALID_REASON, "reddit.com")
        .await
        .unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Granted(_)));
    assert_eq!(gate.controller.state(TAB), TargetState::Approved);
    assert_eq!(gate.settings().history().await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fast_path_expiry() {
    let mut gate = gated_and_approved().await;

    let fired = gate.expiries.recv().await.unwrap();
    assert_eq!(fired.target, TAB);
    assert!(gate.controller.on_expired(fired).await.unwrap());
    assert_eq!(gate.ui.messages_for(TAB), vec![OutboundMessage::TimeExpired]);

    // The durable entry went with it.
    gate.clock.advance(Duration::from_secs(301));
    assert_eq!(gate.controller.sweep().await.unwrap(), 0);
    assert_eq!(gate.ui.messages_for(TAB).len(), 1);
}

#[tokio::test]
async fn test_decline_closes_tab() {
    let mut gate = TestGate::enabled().await;
    gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    gate.ui.take();

    gate.controller.on_close_requested(TAB).await.unwrap();
    assert_eq!(gate.ui.sent(), vec![(TAB, OutboundMessage::CloseTarget)]);
    assert_eq!(gate.controller.state(TAB), TargetState::Ungated);
}

#[tokio::test]
async fn test_closed_tab_never_expires() {
    let mut gate = gated_and_approved().await;
    gate.controller.on_target_closed(TAB).await.unwrap();

    let schedule = ExpirySchedule::new(gate.store.clone()).unwrap();
    assert!(schedule.get(TAB).await.unwrap().is_none());

    gate.clock.advance(Duration::from_secs(600));
    assert_eq!(gate.controller.sweep().await.unwrap(), 0);
    assert!(gate.ui.sent().is_empty());
}

#[tokio::test]
async fn test_unreachable_ui_releases_target() {
    let mut gate = TestGate::enabled().await;
    gate.ui.mark_gone(TAB);

    let decision = gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Unreachable);
    assert_eq!(gate.controller.state(TAB), TargetState::Ungated);
}

#[tokio::test]
async fn test_tab_gone_before_expiry() {
    let mut gate = gated_and_approved().await;
    gate.ui.mark_gone(TAB);
    gate.clock.advance(Duration::from_secs(301));

    assert_eq!(gate.controller.sweep().await.unwrap(), 1);
    assert!(gate.ui.sent().is_empty());
    assert_eq!(gate.controller.state(TAB), TargetState::Ungated);
}

#[tokio::test]
async fn test_navigating_away_releases_approval() {
    let mut gate = gated_and_approved().await;

    let decision = gate
        .controller
        .on_navigation(TAB, "https://example.org/")
        .await
        .unwrap();
    assert_eq!(decision, NavigationDecision::NotBlocked);
    assert_eq!(gate.controller.state(TAB), TargetState::Ungated);

    let decision = gate.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Barrier);
}

#[tokio::test]
async fn test_other_blocked_site_needs_own_reason() {
    let mut gate = gated_and_approved().await;

    let decision = gate
        .controller
        .on_navigation(TAB, "https://x.com/home")
        .await
        .unwrap();
    assert_eq!(decision, NavigationDecision::Barrier);
    assert_eq!(gate.controller.state(TAB), TargetState::PendingReview);
}

#[tokio::test]
async fn test_subdomain_of_approved_site_passes() {
    let mut gate = gated_and_approved().await;
    let decision = gate
        .controller
        .on_navigation(TAB, "https://old.reddit.com/")
        .await
        .unwrap();
    assert_eq!(decision, NavigationDecision::Approved);
}

#[tokio::test]
async fn test_tabs_are_independent() {
    let mut gate = gated_and_approved().await;
    let other = TargetId::new(18);

    let decision = gate.controller.on_navigation(other, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Barrier);
    assert_eq!(gate.controller.state(TAB), TargetState::Approved);
}

#[tokio::test]
async fn test_restart_keeps_open_window() {
    let gate = gated_and_approved().await;
    let (store, clock) = (gate.store.clone(), gate.clock.clone());
    drop(gate);

    clock.advance(Duration::from_secs(60));
    let mut restarted = TestGate::over(store, clock);
    let decision = restarted.controller.on_navigation(TAB, REDDIT).await.unwrap();
    assert_eq!(decision, NavigationDecision::Approved);
    assert!(restarted.ui.sent().is_empty());
}

#[tokio::test]
async fn test_restart_after_window_sweeps() {
    let gate = gated_and_approved().await;
    let (store, clock) = (gate.store.clone(), gate.clock.clone());
    drop(gate);

    clock.advance(Duration::from_secs(3600));
    let mut restarted = TestGate::over(store, clock);
    assert_eq!(restarted.controller.ledger_mut().rehydrate().await.unwrap(), 0);
    assert_eq!(restarted.controller.sweep().await.unwrap(), 1);
    assert_eq!(
        restarted.ui.messages_for(TAB),
        vec![OutboundMessage::TimeExpired]
    );
}

#[tokio::test]
async fn test_spawned_loop_processes_frames() {
    init_test_logging();
    let gate = TestGate::enabled().await;
    let TestGate {
        ui,
        controller,
        expiries,
        ..
    } = gate;

    let shutdown = CancellationToken::new();
    let handle = controller.spawn(expiries, Duration::from_secs(1), shutdown.clone());

    handle
        .send(InboundFrame::new(
            TAB,
            InboundMessage::NavigationCompleted {
                url: REDDIT.to_string(),
            },
        ))
        .await
        .unwrap();
    handle
        .send(GateEvent::Inbound(InboundFrame::new(
            TAB,
            InboundMessage::BarrierApproved {
                reason: VALID_REASON.to_string(),
                site: "reddit.com".to_string(),
            },
        )))
        .await
        .unwrap();

    for _ in 0..200 {
        if ui.messages_for(TAB).len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let messages = ui.messages_for(TAB);
    assert!(matches!(messages[0], OutboundMessage::ShowBarrier { .. }));
    assert!(matches!(messages[1], OutboundMessage::StartTimer { .. }));

    shutdown.cancel();
    handle.join().await;
}
