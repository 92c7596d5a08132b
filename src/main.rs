//! Climate Observations API - Main Server
//!
//! Serves read-only JSON endpoints over the `measurement` and `station`
//! relations of the climate database:
//! 1. Loads surfsup.toml (defaults if absent)
//! 2. Verifies the database is reachable and both relations are readable
//! 3. Serves requests, one connection per request
//!
//! Usage:
//!   cargo run --release                        # Serve on 0.0.0.0:5000
//!   cargo run --release -- --port 8080 -v      # Override port, info logging
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (unless set in surfsup.toml)
//!   RUST_LOG     - overrides the -v verbosity filter

mod cli;
mod logging;

use clap::Parser;
use cli::Cli;
use surfsup::config::{self, ServiceConfig};
use surfsup::db;
use surfsup::endpoint;
use surfsup::store::PgConnector;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = config::load_config(&cli.config)?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    // Fail fast on a bad URL or missing relations; requests open their own
    // connections afterwards.
    let db_url = config.database_url()?;
    let client = db::connect_and_verify(&db_url, db::REQUIRED_TABLES)?;
    drop(client);
    tracing::info!(tables = ?db::REQUIRED_TABLES, "database verified");

    endpoint::start_endpoint_server(&config, PgConnector::new(db_url))
}

fn apply_overrides(config: &mut ServiceConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(workers) = cli.workers {
        config.server.workers = workers;
    }
}
