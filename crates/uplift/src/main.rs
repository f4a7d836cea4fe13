// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Uplift.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Uplift CLI - run one update task or manage the ignore list

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uplift::strategy::FixedNetwork;
use uplift::{
    AppInfo, AutoConfirm, ConfigStore, JsonUpdateParser, NetworkCondition, TaskConfig,
    TaskOutcome, VersionNameChecker, load_settings,
};

#[derive(Parser)]
#[command(name = "uplift")]
#[command(author, version, about = "Check for and install application updates")]
struct Cli {
    /// JSON settings file; created with defaults if missing
    #[arg(long, short, default_value = "uplift.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one check cycle against the configured endpoint
    Check(CheckArgs),

    /// Manage versions the user chose to skip
    Ignored {
        #[command(subcommand)]
        action: IgnoredAction,
    },
}

#[derive(Parser)]
struct CheckArgs {
    /// Version code of the installed application
    #[arg(long)]
    version_code: Option<u32>,

    /// Version name of the installed application; compared instead of the
    /// code when no code is given
    #[arg(long)]
    version_name: Option<String>,

    /// Executable replaced on install (defaults to this binary)
    #[arg(long)]
    target: Option<PathBuf>,

    /// Confirm every prompt
    #[arg(long, short, default_value_t = false)]
    yes: bool,

    /// Network condition reported to the strategy (unmetered, metered, offline)
    #[arg(long)]
    network: Option<NetworkCondition>,
}

#[derive(Subcommand)]
enum IgnoredAction {
    /// Print ignored versions
    List,

    /// Skip a version code from now on
    Add { version_code: u32 },

    /// Forget every ignored version
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uplift=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;

    match cli.command {
        Commands::Check(args) => {
            let store = ConfigStore::create();
            settings.apply(&store)?;
            store.set_update_parser(Arc::new(JsonUpdateParser));

            let mut app = AppInfo::current();
            if let Some(code) = args.version_code {
                app.version_code = code;
            }
            if let Some(name) = &args.version_name {
                app.version_name.clone_from(name);
            }
            if let Some(target) = args.target {
                app = app.with_executable(target);
            }

            let mut task = TaskConfig::with_store(store).with_app_info(app);
            if args.version_code.is_none() && args.version_name.is_some() {
                task = task.with_update_checker(Arc::new(VersionNameChecker));
            }
            if let Some(network) = args.network {
                task = task.with_network_monitor(Arc::new(FixedNetwork(network)));
            }
            if args.yes {
                task = task
                    .with_update_creator(Arc::new(AutoConfirm))
                    .with_install_creator(Arc::new(AutoConfirm));
            }

            match task.check()?.wait().await {
                TaskOutcome::NoUpdate => println!("Already up to date"),
                TaskOutcome::Ignored(update) => {
                    println!("Version {} is ignored", update.version_name);
                }
                TaskOutcome::Cancelled => println!("Update cancelled"),
                TaskOutcome::Installed(update) => {
                    println!("Installed version {}", update.version_name);
                }
                TaskOutcome::Failed(e) => return Err(e).context("Update failed"),
            }
        }
        Commands::Ignored { action } => {
            if settings.ignore_file.is_none() {
                anyhow::bail!(
                    "No ignore_file in {}, nothing is persisted",
                    cli.config.display()
                );
            }
            let list = settings.ignore_list()?;

            match action {
                IgnoredAction::List => {
                    for entry in list.versions() {
                        println!(
                            "{}\t{}",
                            entry.version_code,
                            entry.ignored_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
                IgnoredAction::Add { version_code } => {
                    uplift::traits::IgnoreStore::add(list.as_ref(), version_code)?;
                    info!("Ignoring version {version_code}");
                }
                IgnoredAction::Clear => {
                    list.clear()?;
                    info!("Ignore list cleared");
                }
            }
        }
    }

    Ok(())
}
