//! CopyForge CLI: the main entry point.
//!
//! Commands:
//! - `run`: Generate content for a request
//! - `train`: Repeated runs recorded to a file
//! - `replay`: Re-run the latest run from a stage
//! - `test`: Repeated runs scored by an evaluation model
//! - `config`: Show or edit configuration
//! - `doctor`: Diagnose configuration and reference data

use clap::{Parser, Subcommand};
use copyforge_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "copyforge",
    about = "CopyForge - brand-compliant marketing copy pipeline",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ~/.copyforge/config.toml)
    #[arg(long, global = true, env = "COPYFORGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate content for a request
    Run {
        /// The content request; prompted for when omitted
        #[arg(short, long)]
        request: Option<String>,

        /// Content type (blog, whitepaper, ...)
        #[arg(short = 't', long)]
        content_type: Option<String>,
    },

    /// Run the crew repeatedly and record every run
    Train {
        /// Number of runs
        iterations: u32,

        /// Output JSON file
        filename: PathBuf,
    },

    /// Re-run the latest checkpointed run from a stage
    Replay {
        /// Stage name or 0-based index
        stage: String,
    },

    /// Run the crew repeatedly and score each result
    Test {
        /// Number of runs
        iterations: u32,

        /// Model that scores the results
        eval_model: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and reference data
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (credentials redacted)
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file and reference skeletons
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store an API key (serper, anthropic, openai)
    SetKey { service: String, key: String },

    /// Assign a provider (anthropic, openai) to a stage
    SetProvider { stage: String, provider: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let loaded = AppConfig::load_with_env(&config_path);

    let (level, json) = match &loaded {
        Ok(config) => (config.logging.level.clone(), config.logging.json),
        Err(_) => ("info".to_string(), false),
    };
    init_tracing(if cli.verbose { "debug" } else { level.as_str() }, json || cli.json_logs);

    // Config commands work on the file itself, even when it fails to load.
    if let Commands::Config { action } = cli.command {
        return match action {
            ConfigAction::Show => commands::config_cmd::show(loaded?).await,
            ConfigAction::Path => commands::config_cmd::path(&config_path).await,
            ConfigAction::Init { force } => commands::config_cmd::init(&config_path, force).await,
            ConfigAction::SetKey { service, key } => {
                commands::config_cmd::set_key(&config_path, &service, &key).await
            }
            ConfigAction::SetProvider { stage, provider } => {
                commands::config_cmd::set_provider(&config_path, &stage, &provider).await
            }
        };
    }
    if let Commands::Doctor = cli.command {
        return commands::doctor::run(&config_path, loaded).await;
    }

    let config = loaded.map_err(|e| format!("Failed to load config: {e}"))?;
    match cli.command {
        Commands::Run {
            request,
            content_type,
        } => commands::run::run(config, request, content_type).await?,
        Commands::Train {
            iterations,
            filename,
        } => commands::train::run(config, iterations, &filename).await?,
        Commands::Replay { stage } => commands::replay::run(config, &stage).await?,
        Commands::Test {
            iterations,
            eval_model,
        } => commands::evaluate::run(config, iterations, &eval_model).await?,
        Commands::Config { .. } | Commands::Doctor => {}
    }

    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
