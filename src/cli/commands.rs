//! Command implementation for the opn CLI.

use super::Cli;
use anyhow::{Context, Result};
use colored::Colorize;
use opn::config::{default_config_path, Config};
use opn::{AppSpec, LaunchedProcess, Launcher, OpenOptions};

/// Open the target given on the command line.
pub async fn open(cli: Cli) -> Result<()> {
    let config = Config::load_default()
        .with_context(|| format!("Cannot load config {}", default_config_path().display()))?;

    let options = build_options(&cli, &config)?;
    let launcher = Launcher::new().with_opener(config.opener());

    let launched = launcher
        .open(&cli.target, &options)
        .await
        .with_context(|| format!("cannot open {}", cli.target))?;

    report(launched.as_ref(), cli.json)
}

/// Merge config defaults with command line flags (a set flag always wins).
fn build_options(cli: &Cli, config: &Config) -> Result<OpenOptions> {
    // A command line app replaces the configured one, so that one is not resolved
    let mut config = config.clone();
    if cli.app.is_some() {
        config.defaults.app = None;
    }

    let mut options = config.to_options().context("Cannot resolve the configured app")?;
    options.wait |= cli.wait;
    options.background |= cli.background;
    options.new_instance |= cli.new_instance;
    options.allow_nonzero_exit_code |= cli.allow_nonzero_exit_code;
    options.url |= cli.url;

    if let Some(app) = &cli.app {
        let spec = AppSpec::lookup(app).with_context(|| format!("Cannot resolve {}", app))?;
        options = options.app(spec.with_arguments(cli.app_args.clone()));
    }
    Ok(options)
}

fn report(launched: Option<&LaunchedProcess>, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "pid": launched.and_then(|p| p.id()),
            "command": launched.map(|p| p.command()),
            "exit_code": launched.and_then(|p| p.exit_status()).and_then(|s| s.code()),
        });
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    match launched {
        Some(process) => match process.id() {
            Some(pid) => println!("child process: {}", pid.to_string().cyan()),
            None => println!("{} {}", "✓".green(), process.command()),
        },
        None => println!("{}", "No app to try, nothing opened.".yellow()),
    }
    Ok(())
}
