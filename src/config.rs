//! Config module - Manages opn configuration (opn.toml).
//!
//! Configuration file contains:
//! - Default open options
//! - Default app
//! - POSIX opener override

use crate::error::{OpenError, Result};
use crate::options::{AppSpec, OpenOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "OPN_CONFIG";

/// Default open options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub new_instance: bool,
    #[serde(default)]
    pub allow_nonzero_exit_code: bool,
    #[serde(default)]
    pub url: bool,
    /// App name or registry key (e.g. "firefox", "browserPrivate")
    #[serde(default)]
    pub app: Option<String>,
}

/// POSIX specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixConfig {
    /// Opener used instead of `xdg-open`
    #[serde(default)]
    pub opener: Option<PathBuf>,
}

/// Main opn configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Config version (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub posix: PosixConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            defaults: DefaultsConfig::default(),
            posix: PosixConfig::default(),
        }
    }
}

/// Get default config directory (~/.config/opn/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("opn"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get config file path (`$OPN_CONFIG` wins over the default location).
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| default_config_dir().join("opn.toml"))
}

impl Config {
    /// Load config from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OpenError::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            OpenError::Config(format!("cannot parse config file {}: {}", path.display(), e))
        })
    }

    /// Load config from default path, falling back to defaults if it doesn't exist.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Open options carrying the configured defaults.
    ///
    /// The default app may be a registry key, which is resolved here.
    pub fn to_options(&self) -> Result<OpenOptions> {
        let defaults = &self.defaults;
        let mut options = OpenOptions::new()
            .wait(defaults.wait)
            .background(defaults.background)
            .new_instance(defaults.new_instance)
            .allow_nonzero_exit_code(defaults.allow_nonzero_exit_code)
            .url(defaults.url);
        if let Some(app) = &defaults.app {
            options = options.app(AppSpec::lookup(app)?);
        }
        Ok(options)
    }

    /// Configured POSIX opener, if any.
    pub fn opener(&self) -> Option<&Path> {
        self.posix.opener.as_deref()
    }
}
