//! Solarplan - AI-assisted solar installation planner.
//!
//! Collects site photos and system requirements, then drives the four-step
//! generation pipeline interactively (TUI) or headlessly (`generate`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use solarplan::ai::{CredentialResolver, GeminiClient, SolarGateway, ENV_VAR};
use solarplan::core::Config;
use solarplan::workflow::{StepKey, WorkflowEngine};
use solarplan::{app, tui, App};

/// AI-assisted solar installation planner for your terminal
#[derive(Parser)]
#[command(name = "solarplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive planner (default)
    Run,

    /// Run the full generation pipeline without the TUI
    Generate {
        /// Site photo file (repeatable)
        #[arg(short, long = "photo", value_name = "FILE", required = true)]
        photos: Vec<PathBuf>,

        /// Desired power output in kW
        #[arg(long, default_value = "10")]
        kw: String,

        /// Battery storage in kWh
        #[arg(long, default_value = "15")]
        battery: String,

        /// Panel type (monocrystalline, polycrystalline, thin-film)
        #[arg(long, default_value = "monocrystalline")]
        panel: String,

        /// Inverter type (string, micro, hybrid)
        #[arg(long, default_value = "hybrid")]
        inverter: String,

        /// Additional notes for the analysis
        #[arg(long, default_value = "")]
        notes: String,

        /// Directory for the generated renderings
        #[arg(long, value_name = "DIR", default_value = "renderings")]
        out_dir: PathBuf,
    },

    /// Manage the stored Gemini API key
    Key {
        /// Key operation
        #[command(subcommand)]
        operation: KeyOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Subcommand)]
enum KeyOperation {
    /// Store an API key in the system keychain
    Set {
        /// The key value
        key: String,
    },

    /// Show whether a key is configured
    Show,

    /// Remove the stored key
    Clear,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    match cli.command {
        None | Some(Commands::Run) => cmd_run(),
        Some(Commands::Generate { photos, kw, battery, panel, inverter, notes, out_dir }) => {
            cmd_generate(photos, kw, battery, panel, inverter, notes, out_dir)
        }
        Some(Commands::Key { operation }) => cmd_key(operation),
        Some(Commands::Config { path }) => cmd_config(path),
    }
}

/// Open the interactive planner.
fn cmd_run() -> Result<()> {
    // The runtime outlives the TUI loop so spawned gateway calls can finish.
    let rt = tokio::runtime::Runtime::new()?;

    let config = Config::load_or_default();
    let app = App::new(config, rt.handle().clone());

    tui::run_tui(app)
}

/// Headless pipeline: encode photos, run all four steps, print the results.
fn cmd_generate(
    photos: Vec<PathBuf>,
    kw: String,
    battery: String,
    panel: String,
    inverter: String,
    notes: String,
    out_dir: PathBuf,
) -> Result<()> {
    let credentials = CredentialResolver::new();
    if !credentials.is_available() {
        anyhow::bail!("no API key is configured; run `solarplan key set` or set {ENV_VAR}");
    }

    let config = Config::load_or_default();
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let gateway: Arc<dyn SolarGateway> = Arc::new(GeminiClient::new(&config.ai));
        let mut engine = WorkflowEngine::new(Some(gateway));

        engine.requirements.desired_kw = kw;
        engine.requirements.battery_kwh = battery;
        engine.requirements.panel_type =
            panel.parse().map_err(|()| anyhow::anyhow!("unknown panel type: {panel}"))?;
        engine.requirements.inverter_type =
            inverter.parse().map_err(|()| anyhow::anyhow!("unknown inverter type: {inverter}"))?;
        engine.requirements.additional_notes = notes;

        let count = engine.photos.import(&photos).await?;
        println!("Encoded {count} site photo(s)");

        for step in StepKey::ALL {
            println!("==> {}", step.title());
            if !engine.run(step).await {
                anyhow::bail!("{} could not start: precondition not met", step.title());
            }
            if let Some(error) = &engine.status(step).error {
                anyhow::bail!("{} failed: {error}", step.title());
            }
        }

        let state = engine.state();

        println!("\n--- Component Compatibility ---\n{}", state.compatible_components);

        let saved = app::export_renderings(&state.renderings, &out_dir)?;
        println!("\nSaved {saved} rendering(s) to {}", out_dir.display());

        println!("\n--- Bill of Materials ---");
        for item in &state.bill_of_materials {
            println!(
                "- {} (Qty: {}): {} [Vendor: {}]",
                item.item, item.quantity, item.description, item.vendor
            );
        }

        println!("\n--- Order Sheet ---\n{}", state.order_sheet);
        Ok(())
    })
}

/// Manage the stored API key.
fn cmd_key(operation: KeyOperation) -> Result<()> {
    let credentials = CredentialResolver::new();

    match operation {
        KeyOperation::Set { key } => {
            credentials.store(key.trim())?;
            println!("API key stored in the system keychain");
        }
        KeyOperation::Show => {
            match credentials.stored_fingerprint() {
                Some(fingerprint) => println!("Stored key: {fingerprint}"),
                None => println!("Stored key: none"),
            }
            let env_present =
                std::env::var(ENV_VAR).map(|v| !v.trim().is_empty()).unwrap_or(false);
            println!("{ENV_VAR}: {}", if env_present { "set" } else { "not set" });
            println!("AI available: {}", credentials.is_available());
        }
        KeyOperation::Clear => {
            credentials.clear()?;
            println!("Stored key removed");
        }
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        match Config::path() {
            Some(path) => println!("{}", path.display()),
            None => println!("Config directory could not be determined"),
        }
        return Ok(());
    }

    let config = Config::load_or_default();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
