//! opn - open stuff like URLs, files and executables. Cross-platform.
//!
//! Uses `open` on macOS, PowerShell `Start` on Windows (and WSL), and the app
//! itself or `xdg-open` everywhere else.
//!
//! Pipeline: normalise options -> select strategy -> build command -> spawn
//! (-> wait), with an ordered fallback over candidate apps.
//!
//! ```no_run
//! # async fn demo() -> opn::Result<()> {
//! use opn::{AppKey, AppSpec, OpenOptions};
//!
//! // Default browser
//! opn::open("https://example.com", OpenOptions::default()).await?;
//!
//! // Chrome, whatever it is called here, in incognito mode
//! let chrome = AppSpec::from_registry(AppKey::Chrome)?.with_arguments(["--incognito"]);
//! opn::open("https://example.com", OpenOptions::new().app(chrome)).await?;
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod browser;
pub mod config;
pub mod error;
pub mod launcher;
pub mod options;
pub mod plan;
pub mod platform;
pub mod powershell;
pub mod runner;

// Re-export main types
pub use apps::AppKey;
pub use config::Config;
pub use error::{AggregateError, OpenError, Result};
pub use launcher::Launcher;
pub use options::{AppName, AppSelection, AppSpec, OpenOptions};
pub use runner::LaunchedProcess;

/// Open `target` with the preferred app, or with `options.app`.
///
/// Resolves once the process was spawned, or after it exited when
/// `options.wait` is set. `Ok(None)` only for an empty app list.
pub async fn open(target: &str, options: OpenOptions) -> Result<Option<LaunchedProcess>> {
    Launcher::new().open(target, &options).await
}

/// Open an app by name (or by candidate names), with
/// `options.app_arguments` as its arguments.
pub async fn open_app(
    name: impl Into<AppName>,
    options: OpenOptions,
) -> Result<Option<LaunchedProcess>> {
    Launcher::new().open_app(name, &options).await
}
