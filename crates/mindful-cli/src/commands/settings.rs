//! Gate settings commands - blocklist, toggle, window length and history.
//!
//! These open the store directly. The persistent backend is single-process,
//! so stop a running `mindful serve` first.

use anyhow::Result;
use colored::Colorize;
use mindful_core::Timestamp;
use mindful_gate::settings::{RECENT_HISTORY_WINDOW, relative_time};
use mindful_gate::{AddSiteOutcome, AllowAllPermissions, SettingsStore};

use crate::theme::Theme;

/// List the blocklist.
pub(crate) async fn list_sites(settings: &SettingsStore) -> Result<()> {
    let current = settings.try_load().await?;
    let state = if current.enabled {
        "on".green()
    } else {
        "off".red()
    };

    println!("\n{}", Theme::header("Blocked Sites"));
    println!(
        "{}",
        Theme::dimmed(&format!(
            "gate {state}, {} minute window",
            current.timer_minutes
        ))
    );
    println!("{}", Theme::separator());
    if current.blocked_sites.is_empty() {
        println!("{}", Theme::info("No sites blocked"));
    }
    for site in &current.blocked_sites {
        println!("  {site}");
    }
    println!();
    Ok(())
}

/// Add a site.
pub(crate) async fn add_site(settings: &SettingsStore, raw: &str) -> Result<()> {
    match settings.add_site(raw, &AllowAllPermissions).await? {
        AddSiteOutcome::Added(site) => println!("{}", Theme::success(&format!("Blocked {site}"))),
        AddSiteOutcome::Empty => println!("{}", Theme::error("Enter a site to block")),
        AddSiteOutcome::Invalid(site) => {
            println!("{}", Theme::error(&format!("'{site}' is not a domain")));
        },
        AddSiteOutcome::Duplicate(site) => {
            println!("{}", Theme::warning(&format!("{site} is already blocked")));
        },
        AddSiteOutcome::PermissionDenied(site) => {
            println!("{}", Theme::error(&format!("Access to {site} was refused")));
        },
    }
    Ok(())
}

/// Remove a site.
pub(crate) async fn remove_site(settings: &SettingsStore, site: &str) -> Result<()> {
    let site = mindful_gate::site::normalize_site(site);
    if settings.remove_site(&site, &AllowAllPermissions).await? {
        println!("{}", Theme::success(&format!("Unblocked {site}")));
    } else {
        println!("{}", Theme::warning(&format!("{site} was not blocked")));
    }
    Ok(())
}

/// Turn the gate on or off.
pub(crate) async fn set_enabled(settings: &SettingsStore, enabled: bool) -> Result<()> {
    settings.set_enabled(enabled).await?;
    let text = if enabled { "Gate enabled" } else { "Gate disabled" };
    println!("{}", Theme::success(text));
    Ok(())
}

/// Set the window length.
pub(crate) async fn set_timer(settings: &SettingsStore, minutes: u32) -> Result<()> {
    settings.set_timer_minutes(minutes).await?;
    println!(
        "{}",
        Theme::success(&format!("Approval window set to {minutes} minutes"))
    );
    Ok(())
}

/// Show reason history: the last day grouped by site, or every stored
/// entry with `all`.
pub(crate) async fn show_history(settings: &SettingsStore, all: bool) -> Result<()> {
    let now = Timestamp::now();

    if all {
        let history = settings.history().await?;
        println!("\n{}", Theme::header("Reason History"));
        println!("{}", Theme::separator());
        if history.is_empty() {
            println!("{}", Theme::info("No reasons recorded"));
        }
        for entry in history.iter().rev() {
            println!(
                "  {:>10}  {}  {}",
                relative_time(now, entry.timestamp).dimmed(),
                entry.site.cyan(),
                entry.reason
            );
        }
        println!();
        return Ok(());
    }

    let groups = settings.recent_history(now, RECENT_HISTORY_WINDOW).await?;
    println!("\n{}", Theme::header("Last 24 Hours"));
    println!("{}", Theme::separator());
    if groups.is_empty() {
        println!("{}", Theme::info("No reasons in the last 24 hours"));
    }
    for group in &groups {
        println!("{} {}", group.site.bold(), Theme::dimmed(&format!("({})", group.entries.len())));
        for entry in &group.entries {
            println!(
                "  {:>10}  {}",
                relative_time(now, entry.timestamp).dimmed(),
                entry.reason
            );
        }
    }
    println!();
    Ok(())
}
