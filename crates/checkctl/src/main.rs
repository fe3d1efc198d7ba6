//! Check engine CLI
//!
//! A command-line tool for listing the built-in checks and inspecting how
//! an override document resolves for a given application.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use check_engine::{ApplicationCategory, ApplicationId};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{checks, resolve, slo};
use crate::config::CheckctlConfig;

/// Check engine CLI
#[derive(Parser)]
#[command(name = "checkctl")]
#[command(author, version, about = "Inspect health checks and their configuration overrides", long_about = None)]
pub struct Cli {
    /// Override document (JSON, keyed by selector then check id)
    #[arg(long, env = "CHECKCTL_OVERRIDES")]
    pub overrides: Option<PathBuf>,

    /// CLI configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List built-in checks and their defaults
    Checks,

    /// Show resolved thresholds for an application
    Resolve {
        /// Application id (format: namespace:Kind:name)
        app: String,

        /// Only show this check
        #[arg(long)]
        check: Option<String>,
    },

    /// Show resolved SLO objectives for an application
    Slo {
        /// Application id (format: namespace:Kind:name)
        app: String,

        /// Application category (e.g. application, control-plane, monitoring)
        #[arg(long, default_value = ApplicationCategory::APPLICATION)]
        category: String,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn parse_app(app: &str) -> Result<ApplicationId> {
    app.parse()
        .with_context(|| format!("Invalid application id {:?}", app))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = CheckctlConfig::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, settings.log_json);

    let overrides_path = cli.overrides.clone().or_else(|| settings.overrides.clone());
    debug!(overrides = ?overrides_path, "Loading override document");
    let configs = crate::config::load_overrides(overrides_path.as_deref())?;

    match cli.command {
        Commands::Checks => checks::list_checks(cli.format)?,
        Commands::Resolve { app, check } => {
            let app = parse_app(&app)?;
            resolve::resolve_thresholds(&configs, &app, check.as_deref(), cli.format)?;
        }
        Commands::Slo { app, category } => {
            let app = parse_app(&app)?;
            let category = ApplicationCategory::new(category);
            slo::show_slo(&configs, &app, &category, &settings.slo, cli.format)?;
        }
    }

    Ok(())
}
