//! opn CLI - open URLs, files and executables from the command line.
//!
//! Usage:
//!   opn <file|url> [app] [app arguments]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::Colorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("opn={}", log_level).parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli::commands::open(cli).await {
        eprintln!("{} {:#}", "✗".red(), err);
        std::process::exit(1);
    }

    Ok(())
}
