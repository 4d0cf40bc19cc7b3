//! Warspear Wiki CLI - content backend for the Warspear Online wiki

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warspear_wiki::config::{default_config_path, resolve_config};

#[derive(Parser)]
#[command(name = "warspear-wiki")]
#[command(version)]
#[command(about = "Content backend for the Warspear Online wiki")]
#[command(long_about = r#"
Warspear Wiki stores and serves the game data behind the wiki:
  • Classes, skills, talents and items with per-level values
  • Guides, lore and news posts with tags
  • News events synced from the official feed and translated
  • A JSON HTTP API for the site frontend

Example usage:
  warspear-wiki init
  warspear-wiki import data/classes.json
  warspear-wiki describe eagle-eye
  warspear-wiki serve --port 8080
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to wiki.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Import a JSON bundle of game data and posts
    Import {
        /// Path to the bundle file
        file: PathBuf,
    },

    /// Fetch the news feed and store new events
    SyncEvents {
        /// Maximum number of new items to process
        #[arg(long)]
        max_items: Option<usize>,

        /// Store items untranslated
        #[arg(long)]
        no_translate: bool,
    },

    /// Show row counts per table
    Stats,

    /// Render a skill description with its per-level values
    Describe {
        /// Skill slug
        slug: String,
    },

    /// Print the talent grid of a class
    Grid {
        /// Class slug
        slug: String,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print a JSON success envelope
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    debug_assert!(!output_mode.is_human());
    let envelope = serde_json::json!({ "ok": true, "command": command, "data": data });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn emit_error(command: &str, err: &anyhow::Error) {
    let envelope = serde_json::json!({ "ok": false, "command": command, "error": err.to_string() });
    println!("{}", envelope);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let load = || resolve_config(Some(&config_path));

    let (name, result) = match cli.command {
        Commands::Init { force } => ("init", commands::run_init(&config_path, force, output_mode)),
        Commands::Version => ("version", commands::run_version(output_mode)),
        Commands::Serve { port, bind } => match load() {
            Ok(config) => ("serve", commands::run_serve(config, port, bind).await),
            Err(e) => ("serve", Err(e)),
        },
        Commands::Import { file } => ("import", load().and_then(|c| commands::run_import(&c, &file, output_mode))),
        Commands::SyncEvents { max_items, no_translate } => match load() {
            Ok(config) => (
                "sync-events",
                commands::run_sync_events(&config, max_items, no_translate, output_mode).await,
            ),
            Err(e) => ("sync-events", Err(e)),
        },
        Commands::Stats => ("stats", load().and_then(|c| commands::run_stats(&c, output_mode))),
        Commands::Describe { slug } => ("describe", load().and_then(|c| commands::run_describe(&c, &slug, output_mode))),
        Commands::Grid { slug } => ("grid", load().and_then(|c| commands::run_grid(&c, &slug, output_mode))),
    };

    if let Err(e) = result {
        if output_mode.is_human() {
            warspear_wiki::ui::error(&format!("{} failed: {}", name, e));
        } else {
            emit_error(name, &e);
        }
        std::process::exit(1);
    }

    Ok(())
}
