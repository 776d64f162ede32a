use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Construction-site dashboard.
/// Each site is stored as a JSON file in the data directory, or at a path passed via --db.
#[derive(Parser)]
#[command(name = "sitedash", version, about = "Construction-site progress dashboard")]
pub struct Cli {
    /// Path to the site store JSON file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the config file (default: <data dir>/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
