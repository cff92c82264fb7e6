//! CLI module for Chartographer
//!
//! Provides commands:
//! - `serve`: Start the HTTP server (default)
//! - `doctor`: Check configuration and the canvas directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod doctor;

/// Chartographer CLI
#[derive(Parser, Debug)]
#[command(name = "chartographer")]
#[command(about = "Storage service for large raster canvases")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory for canvas files (overrides storage.data_dir)
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve {
        /// Directory for canvas files (overrides storage.data_dir)
        data_dir: Option<PathBuf>,
    },
    /// Run configuration and storage diagnostics
    Doctor {
        /// Directory for canvas files (overrides storage.data_dir)
        data_dir: Option<PathBuf>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve { data_dir }) => crate::server::run(data_dir.as_deref()).await,
        Some(Commands::Doctor { data_dir }) => doctor::run(data_dir.as_deref()).await,
        None => crate::server::run(cli.data_dir.as_deref()).await,
    }
}
