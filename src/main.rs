use std::collections::HashMap;
use std::path::{Path, PathBuf};

use addonhost::addons::{
    check_abi, load_descriptors, AddonHost, AddonLoader, AddonRecord, NativeModule,
    NativeModuleLoader, Resolution, ADDON_ABI_VERSION,
};
use addonhost::config::HostConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Resolve and inspect runtime addons.
#[derive(Parser, Debug)]
#[command(name = "addonhost", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover, resolve and list addons with their final state
    List {
        /// Addon descriptor directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Preferred UI addon
        #[arg(long)]
        ui: Option<String>,

        /// Open native modules and apply the ABI gate (runs module initialisers)
        #[arg(long)]
        load: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check a native module against the runtime ABI version
    CheckAbi {
        /// Path to the shared library
        library: PathBuf,
    },
}

/// One line of `list` output.
#[derive(Debug, Serialize)]
struct AddonRow {
    name: String,
    category: String,
    #[serde(rename = "type")]
    addon_type: String,
    priority: i32,
    enabled: bool,
    dependency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl AddonRow {
    fn new(addon: &AddonRecord, reasons: &HashMap<String, String>) -> Self {
        let reason = if addon.enabled {
            None
        } else {
            Some(
                reasons
                    .get(&addon.name)
                    .cloned()
                    .unwrap_or_else(|| "disabled in config".into()),
            )
        };

        Self {
            name: addon.name.clone(),
            category: addon.category.to_string(),
            addon_type: addon.addon_type.to_string(),
            priority: addon.priority,
            enabled: addon.enabled,
            dependency: addon.dependency().to_string(),
            reason,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::load_or_default()?,
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_tracing(&config.log_level);

    match cli.command {
        Commands::List {
            dir,
            ui,
            load,
            json,
        } => {
            if let Some(dir) = dir {
                config.addon_dir = dir;
            }
            if ui.is_some() {
                config.ui = ui;
            }
            list(&config, load, json)
        }
        Commands::CheckAbi { library } => check_module(&library),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list(config: &HostConfig, load: bool, json: bool) -> Result<()> {
    let records = load_descriptors(&config.addon_dir).with_context(|| {
        format!(
            "Failed to read addon directory: {}",
            config.addon_dir.display()
        )
    })?;

    let host = AddonHost::new(config.ui.clone());
    let (mut registry, resolution) = host.build(records);
    let mut reasons = disable_reasons(&resolution);

    if load {
        // SAFETY: the user asked for modules from the configured directories
        // to be opened
        let modules = unsafe { NativeModuleLoader::trusted(config.module_dir.clone()) };
        let report = AddonLoader::new(modules).load_all(&mut registry);
        for rejected in report.rejected {
            reasons.insert(rejected.name, rejected.error.to_string());
        }
        for disabled in report.cascaded {
            reasons.insert(disabled.name, disabled.reason.to_string());
        }
    }

    host.publish(registry);
    let snapshot = host.snapshot();
    let rows: Vec<AddonRow> = snapshot
        .iter()
        .map(|addon| AddonRow::new(addon, &reasons))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        let state = if row.enabled { "enabled" } else { "disabled" };
        print!(
            "{:<24} {:<13} {:>6}  {:<8}",
            row.name, row.category, row.priority, state
        );
        match &row.reason {
            Some(reason) => println!("  {reason}"),
            None => println!(),
        }
    }
    match snapshot.enabled().find(|addon| addon.is_ui()) {
        Some(ui) => println!("\nActive UI: {}", ui.name),
        None => println!("\nActive UI: none"),
    }
    Ok(())
}

fn disable_reasons(resolution: &Resolution) -> HashMap<String, String> {
    resolution
        .disabled
        .iter()
        .map(|d| (d.name.clone(), d.reason.to_string()))
        .collect()
}

fn check_module(library: &Path) -> Result<()> {
    // SAFETY: the user named this library explicitly
    let module = unsafe { NativeModule::open(library) }?;

    match check_abi(&module) {
        Ok(version) => {
            println!(
                "{}: ABI version {version} accepted (runtime {ADDON_ABI_VERSION})",
                library.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(module_path = %library.display(), error = %e, "ABI check failed");
            anyhow::bail!("{}: {e}", library.display())
        }
    }
}
