//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod annotate;
mod download;
mod info;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "concept-annotator")]
#[command(about = "Concept annotation service for clinical free text")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the annotation HTTP service
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: SERVER_BIND or 0.0.0.0:5000)
        bind: Option<String>,
    },

    /// Print service identity as JSON
    Info,

    /// Annotate a JSON payload file locally and print the response
    Annotate {
        /// Treat the payload as a bulk request (`content` is a list)
        #[arg(short, long)]
        bulk: bool,

        /// Payload file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Download a concept database described by MODEL_* environment variables
    DownloadModel {
        /// Directory to store models in (default: platform data dir)
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, _config) = load_settings(options).await?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Info => info::cmd_info(&settings),
        Commands::Annotate { bulk, input } => annotate::cmd_annotate(&settings, &input, bulk).await,
        Commands::DownloadModel { models_dir } => {
            download::cmd_download_model(models_dir.as_deref()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["concept-annotator", "-v", "serve", "8080"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { bind: Some(ref b) } if b == "8080"));

        let cli =
            Cli::try_parse_from(["concept-annotator", "annotate", "--bulk", "docs.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Annotate { bulk: true, ref input } if input == "docs.json"
        ));

        let cli = Cli::try_parse_from([
            "concept-annotator",
            "--config",
            "/etc/annotator.toml",
            "info",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/annotator.toml")));
    }
}
