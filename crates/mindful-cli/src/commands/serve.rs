//! Serve command - host the gate controller behind the WebSocket bridge.

use std::sync::Arc;

use anyhow::{Context, Result};
use mindful_approval::{ApprovalLedger, ExpirySchedule, ExpiryTimers};
use mindful_cli::config_bridge::to_validator_config;
use mindful_cli::server::BridgeServer;
use mindful_cli::store::OpenStore;
use mindful_config::Config;
use mindful_core::SystemClock;
use mindful_gate::{GateController, SettingsStore};
use mindful_reason::ReasonValidator;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::theme::Theme;

/// Run until Ctrl-C.
pub(crate) async fn run_serve(config: &Config, opened: OpenStore) -> Result<()> {
    let store = opened.store();

    let settings = SettingsStore::new(Arc::clone(&store))?;
    settings
        .initialize_defaults()
        .await
        .context("failed to seed gate settings")?;

    let schedule = ExpirySchedule::new(Arc::clone(&store))?;
    let (timers, expiries) = ExpiryTimers::channel();
    let mut ledger = ApprovalLedger::new(Arc::new(SystemClock), schedule, timers);
    let restored = ledger.rehydrate().await?;
    if restored > 0 {
        info!(restored, "Restored open approval windows");
    }

    let validator = ReasonValidator::new(to_validator_config(&config.validator))?;

    let address = config.server.address();
    let server = BridgeServer::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    let bound = server.local_addr()?;

    let controller = GateController::new(ledger, settings, validator, Arc::new(server.routes()));
    let shutdown = CancellationToken::new();
    let gate = controller.spawn(
        expiries,
        config.scheduler.sweep_interval(),
        shutdown.clone(),
    );
    let bridge = tokio::spawn(server.serve(gate.sender(), shutdown.clone()));

    println!(
        "{}",
        Theme::success(&format!("Listening for the extension on ws://{bound}"))
    );
    println!("{}", Theme::dimmed("Press Ctrl-C to stop"));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down");
    shutdown.cancel();

    if let Err(e) = bridge.await {
        tracing::warn!(error = %e, "Bridge task failed");
    }
    gate.join().await;
    opened.close().await?;
    Ok(())
}
