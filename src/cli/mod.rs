//! CLI definitions and command implementations for opn.

pub mod commands;

use clap::{ArgAction, Parser};

/// opn - open stuff like URLs, files and executables
#[derive(Parser, Debug)]
#[command(name = "opn")]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
#[command(after_help = "Examples:
  $ opn https://example.com
  $ opn https://example.com firefox
  $ opn https://example.com chrome --incognito
  $ opn unicorn.png --wait")]
pub struct Cli {
    /// File, URL or executable to open
    pub target: String,

    /// App to open the target with: name, path, or one of
    /// chrome, firefox, edge, brave, safari, browser, browserPrivate
    pub app: Option<String>,

    /// Arguments passed to the app
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub app_args: Vec<String>,

    /// Wait for the app to exit
    #[arg(long)]
    pub wait: bool,

    /// Do not bring the app to the foreground (macOS)
    #[arg(long)]
    pub background: bool,

    /// Open a new instance even if one is already running
    #[arg(long)]
    pub new_instance: bool,

    /// With --wait, treat a nonzero exit code as success
    #[arg(long)]
    pub allow_nonzero_exit_code: bool,

    /// Encode the target as a URL first
    #[arg(long)]
    pub url: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}
