//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Dowser - embedding-based bug localization backend.
#[derive(Parser)]
#[command(name = "dowser")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./dowser.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP analysis server
    Serve(ServeArgs),

    /// Run the localization pipeline for one bug and print JSON
    #[command(alias = "loc")]
    Localize(LocalizeArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args)]
pub struct LocalizeArgs {
    /// Bug identifier from the dataset
    pub bug_id: u32,

    /// Restrict to a single candidate file
    #[arg(long)]
    pub file: Option<String>,
}
