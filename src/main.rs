//! quartzdb-config-check
//!
//! Loads the effective QuartzDB configuration exactly as the server would
//! and prints it, so operators can validate changes before a restart.

use anyhow::Result;
use clap::Parser;
use quartzdb_config::{ConfigLoader, Resolver};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "quartzdb-config-check",
    version,
    about = "Load, validate, and print the effective QuartzDB configuration"
)]
struct Cli {
    /// Explicit configuration location (file://... or http(s)://...). When
    /// omitted, the standard resolution rules apply, including the overlay.
    location: Option<String>,

    /// Validate only; do not print the effective configuration.
    #[arg(short, long)]
    quiet: bool,

    /// Log resolution and load steps to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.location {
        Some(location) => {
            let resolved = Resolver::from_env().resolve_name("the command line", location)?;
            ConfigLoader::load_location(&resolved)?
        }
        None => ConfigLoader::from_env()?.load()?,
    };

    if !cli.quiet {
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}
