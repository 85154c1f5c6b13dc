//! # waycraft
//!
//! Command-line driver: inspect need evaluation, summarize an inventory
//! fixture, or run a full crafting session against the simulated inventory.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use waycraft_core::logging::init_subscriber;
use waycraft_core::{Rarity, evaluate};
use waycraft_runtime::{
    InventoryOverview, SessionController, SessionReport, SimulatedInventory, StartOutcome,
};
use waycraft_settings::{
    CraftSettings, TimingSettings, get_settings, init_settings, load_settings_from_path,
};

/// Waystone crafting and distillation automation.
#[derive(Parser, Debug)]
#[command(name = "waycraft", about = "Waystone crafting and distillation automation")]
struct Cli {
    /// Settings file (defaults to `~/.waycraft/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what an item in the given state still needs.
    Needs {
        /// Rarity: normal, magic or rare.
        #[arg(long, value_parser = parse_rarity)]
        rarity: Rarity,
        /// Explicit modifier count.
        #[arg(long, default_value_t = 0)]
        modifiers: u32,
        /// The item is already distilled.
        #[arg(long)]
        finalized: bool,
    },

    /// Summarize an inventory fixture without touching it.
    Overview {
        /// Inventory fixture (JSON).
        #[arg(long)]
        fixture: PathBuf,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Run a full session against a simulated inventory and print the report.
    Simulate {
        /// Inventory fixture (JSON).
        #[arg(long)]
        fixture: PathBuf,
        /// Skip every settle delay.
        #[arg(long)]
        instant: bool,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the effective settings.
    Settings,
}

fn parse_rarity(raw: &str) -> std::result::Result<Rarity, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| format!("unknown rarity: {raw}"))
}

/// Install an explicit settings file as the global settings, if one was
/// given; otherwise the first [`get_settings`] call loads the default file.
fn install_settings(path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        let settings = load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?;
        if init_settings(settings).is_err() {
            anyhow::bail!("settings were already initialized");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    install_settings(cli.settings.as_deref())?;
    let settings = get_settings();
    init_subscriber(&settings.logging.level);

    match cli.command {
        Command::Needs {
            rarity,
            modifiers,
            finalized,
        } => {
            let needs = evaluate(rarity, modifiers, finalized);
            println!("{}", needs.summary());
        }
        Command::Overview { fixture, json } => {
            let sim = load_fixture(&fixture)?;
            let overview = InventoryOverview::collect(&sim, settings.distillation.reagent.kind())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print!("{overview}");
            }
        }
        Command::Simulate {
            fixture,
            instant,
            json,
        } => {
            let mut settings = settings.clone();
            if instant {
                settings.timing = TimingSettings::instant();
            }
            let sim = Arc::new(simulated_inventory(&fixture, &settings)?);
            let report = simulate(sim, settings).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
    }

    Ok(())
}

fn load_fixture(path: &Path) -> Result<SimulatedInventory> {
    SimulatedInventory::from_fixture_file(path)
        .with_context(|| format!("Failed to load fixture: {}", path.display()))
}

/// Fixture inventory laid out where the settings say the workspace is.
fn simulated_inventory(path: &Path, settings: &CraftSettings) -> Result<SimulatedInventory> {
    let layout = &settings.distillation;
    Ok(load_fixture(path)?.with_layout(layout.finalize_button, layout.retrieve_slot))
}

/// Run one session; Ctrl-C acts as the emergency stop.
async fn simulate(sim: Arc<SimulatedInventory>, settings: CraftSettings) -> Result<SessionReport> {
    let controller = SessionController::new(sim.clone(), sim, settings);
    if let StartOutcome::Started(id) = controller.start_session() {
        tracing::info!(session = %id, "session started");
    }

    let wait = controller.wait();
    tokio::pin!(wait);
    let report = tokio::select! {
        report = &mut wait => report,
        _ = tokio::signal::ctrl_c() => {
            let _ = controller.request_cancel();
            wait.await
        }
    };
    report.context("session produced no report")
}

fn print_summary(report: &SessionReport) {
    println!("Session {}: {:?}", report.session_id, report.outcome);
    println!(
        "Processed {} item(s), skipped {}",
        report.items_processed(),
        report.items_skipped()
    );
    for item in &report.items {
        let ops: Vec<String> = item.operations.iter().map(ToString::to_string).collect();
        let status = match &item.skipped {
            Some(reason) => format!("skipped ({reason:?})"),
            None if item.distilled => "distilled".to_owned(),
            None => "not distilled".to_owned(),
        };
        println!("  {} {}: [{}] {status}", item.handle, item.name, ops.join(", "));
    }
    for shortage in &report.shortages {
        let scope = shortage
            .item
            .map_or_else(|| "batch".to_owned(), |h| h.to_string());
        println!(
            "  shortage ({scope}): {} need {}, have {}",
            shortage.resource, shortage.needed, shortage.available
        );
    }
}
