use std::path::PathBuf;

use clap::Parser;

/// Read-only JSON API over the Hawaii climate observations.
#[derive(Debug, Parser)]
#[command(name = "surfsup", version, about = "Climate observations HTTP API")]
pub struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "surfsup.toml")]
    pub config: PathBuf,

    /// Override listen address from config.
    #[arg(long)]
    pub host: Option<String>,

    /// Override listen port from config.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override worker thread count from config.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
