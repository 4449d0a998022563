//! Mindful CLI - a pause before distracting sites.
//!
//! `mindful serve` hosts the gate for the browser extension; the other
//! subcommands edit the blocklist and inspect reason history in the same
//! store.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mindful_cli::config_bridge;
use mindful_cli::store::OpenStore;
use mindful_config::Config;
use mindful_gate::SettingsStore;

mod commands;
mod theme;

use commands::{check, serve, settings};

/// Mindful - justify it before you open it
#[derive(Parser)]
#[command(name = "mindful")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file, layered over ~/.mindful/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host the gate for the browser extension
    Serve {
        /// Override the listening port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check whether a reason would be accepted
    Check {
        /// The reason to check
        text: String,
    },

    /// Manage the blocklist
    Sites {
        #[command(subcommand)]
        command: SiteCommands,
    },

    /// Turn the gate on
    Enable,

    /// Turn the gate off
    Disable,

    /// Set the approval window length
    Timer {
        /// Minutes per accepted reason
        minutes: u32,
    },

    /// Show recent reasons
    History {
        /// Show every stored reason instead of the last 24 hours
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum SiteCommands {
    /// List blocked sites
    List,
    /// Block a site
    Add {
        /// Domain or URL, e.g. reddit.com
        site: String,
    },
    /// Unblock a site
    Remove {
        /// Domain as listed
        site: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());

    // Set up logging from config, with --verbose override.
    let log_config = if let Ok(cfg) = &loaded {
        let mut lc = config_bridge::to_log_config(cfg);
        if cli.verbose {
            "debug".clone_into(&mut lc.level);
        }
        lc
    } else {
        let level = if cli.verbose { "debug" } else { "warn" };
        mindful_telemetry::LogConfig::new(level)
    };
    if let Err(e) = mindful_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut config = loaded.context("failed to load configuration")?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let opened = open_store(&config)?;
            serve::run_serve(&config, opened).await?;
        },
        Commands::Check { text } => {
            if !check::run_check(&config, &text)? {
                std::process::exit(1);
            }
        },
        Commands::Sites { command } => {
            with_settings(&config, |s| async move {
                match command {
                    SiteCommands::List => settings::list_sites(&s).await,
                    SiteCommands::Add { site } => settings::add_site(&s, &site).await,
                    SiteCommands::Remove { site } => settings::remove_site(&s, &site).await,
                }
            })
            .await?;
        },
        Commands::Enable => {
            with_settings(&config, |s| async move { settings::set_enabled(&s, true).await })
                .await?;
        },
        Commands::Disable => {
            with_settings(&config, |s| async move { settings::set_enabled(&s, false).await })
                .await?;
        },
        Commands::Timer { minutes } => {
            with_settings(&config, |s| async move { settings::set_timer(&s, minutes).await })
                .await?;
        },
        Commands::History { all } => {
            with_settings(&config, |s| async move { settings::show_history(&s, all).await })
                .await?;
        },
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<OpenStore> {
    let default_dir = mindful_config::loader::mindful_home()?.join("data");
    OpenStore::open(&config.storage, default_dir).context("failed to open store")
}

/// Open the store, seed first-run defaults, run `f`, then close the store.
async fn with_settings<F, Fut>(config: &Config, f: F) -> Result<()>
where
    F: FnOnce(SettingsStore) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let opened = open_store(config)?;
    let settings = SettingsStore::new(opened.store())?;
    settings.initialize_defaults().await?;
    let result = f(settings).await;
    opened.close().await?;
    result
}
