//! Command-line interface.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "contentmill")]
#[command(about = "Batch blog-content generation driven by a local LLM")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to contentmill.toml, then the user config dir)
    #[arg(long, global = true)]
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
    /// Start the web server
    Serve {
        /// Bind address: host:port, just a host, or just a port
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Generate posts from a topic file without going through the server
    Generate {
        /// Topic file (.xlsx, .csv, or .json)
        input: PathBuf,
        /// Export format: xlsx, csv, markdown, json, pdf, or google_sheets
        #[arg(short, long, default_value = "markdown")]
        format: String,
        /// Output path (defaults next to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Topics per batch (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Write the example topic spreadsheet
    Sample {
        /// Output path
        #[arg(default_value = "blog_ideas_example.xlsx")]
        output: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            commands::cmd_serve(&settings, &bind).await
        }
        Commands::Generate {
            input,
            format,
            output,
            batch_size,
        } => commands::cmd_generate(&settings, &input, &format, output.as_deref(), batch_size).await,
        Commands::Sample { output } => commands::cmd_sample(&output),
    }
}
