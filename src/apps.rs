//! App registry: auto-detected binary names for common apps.
//!
//! App names are platform dependent (Chrome is `google chrome` on macOS,
//! `google-chrome` on Linux and `chrome` on Windows). The table is computed
//! once per process for the detected platform and never changes afterwards.

use crate::browser::DefaultBrowser;
use crate::error::{OpenError, Result};
use crate::options::AppName;
use crate::platform::{Arch, Environment, OsFamily};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

/// Registry keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppKey {
    Chrome,
    Firefox,
    Edge,
    Brave,
    Safari,
    /// The system default browser
    Browser,
    /// The system default browser in private/incognito mode
    BrowserPrivate,
}

impl AppKey {
    pub const ALL: [AppKey; 7] = [
        Self::Chrome,
        Self::Firefox,
        Self::Edge,
        Self::Brave,
        Self::Safari,
        Self::Browser,
        Self::BrowserPrivate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Edge => "edge",
            Self::Brave => "brave",
            Self::Safari => "safari",
            Self::Browser => "browser",
            Self::BrowserPrivate => "browserPrivate",
        }
    }

    /// Sentinels resolve through default-browser detection, not the table.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Browser | Self::BrowserPrivate)
    }

    /// Command-line flag opening a private window, if the browser has one.
    pub fn private_flag(&self) -> Option<&'static str> {
        match self {
            Self::Chrome | Self::Brave => Some("--incognito"),
            Self::Firefox => Some("--private-window"),
            Self::Edge => Some("--inPrivate"),
            _ => None,
        }
    }

    /// Registry key for a default-browser identifier (bundle id or .desktop file).
    pub fn from_browser_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "com.google.chrome" | "google-chrome.desktop" => Some(Self::Chrome),
            "org.mozilla.firefox" | "firefox.desktop" => Some(Self::Firefox),
            "com.microsoft.msedge" | "com.microsoft.edge" | "microsoft-edge.desktop" => {
                Some(Self::Edge)
            }
            "com.brave.browser" | "brave-browser.desktop" => Some(Self::Brave),
            "com.apple.safari" => Some(Self::Safari),
            _ => None,
        }
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppKey {
    type Err = OpenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| OpenError::invalid(format!("unknown app `{}`", s)))
    }
}

/// Binary for one platform: the same everywhere, or per CPU architecture.
///
/// WSL paths are relative to the drives mount point (`c/...`).
enum Binary {
    Any(&'static [&'static str]),
    PerArch {
        x86: &'static [&'static str],
        x86_64: &'static [&'static str],
    },
}

struct Entry {
    macos: Option<&'static [&'static str]>,
    windows: Option<&'static [&'static str]>,
    linux: Option<&'static [&'static str]>,
    wsl: Option<Binary>,
}

fn entry(key: AppKey) -> Entry {
    match key {
        AppKey::Chrome => Entry {
            macos: Some(&["google chrome"]),
            windows: Some(&["chrome"]),
            linux: Some(&["google-chrome", "google-chrome-stable", "chromium"]),
            wsl: Some(Binary::PerArch {
                x86: &["c/Program Files (x86)/Google/Chrome/Application/chrome.exe"],
                x86_64: &[
                    "c/Program Files/Google/Chrome/Application/chrome.exe",
                    "c/Program Files (x86)/Google/Chrome/Application/chrome.exe",
                ],
            }),
        },
        AppKey::Firefox => Entry {
            macos: Some(&["firefox"]),
            windows: Some(&[r"C:\Program Files\Mozilla Firefox\firefox.exe"]),
            linux: Some(&["firefox"]),
            wsl: Some(Binary::Any(&["c/Program Files/Mozilla Firefox/firefox.exe"])),
        },
        AppKey::Edge => Entry {
            macos: Some(&["microsoft edge"]),
            windows: Some(&["msedge"]),
            linux: Some(&["microsoft-edge", "microsoft-edge-dev"]),
            wsl: Some(Binary::Any(&[
                "c/Program Files (x86)/Microsoft/Edge/Application/msedge.exe",
            ])),
        },
        AppKey::Brave => Entry {
            macos: Some(&["brave browser"]),
            windows: Some(&["brave"]),
            linux: Some(&["brave-browser", "brave"]),
            wsl: Some(Binary::PerArch {
                x86: &["c/Program Files (x86)/BraveSoftware/Brave-Browser/Application/brave.exe"],
                x86_64: &[
                    "c/Program Files/BraveSoftware/Brave-Browser/Application/brave.exe",
                    "c/Program Files (x86)/BraveSoftware/Brave-Browser/Application/brave.exe",
                ],
            }),
        },
        AppKey::Safari => Entry {
            macos: Some(&["safari"]),
            windows: None,
            linux: None,
            wsl: None,
        },
        AppKey::Browser | AppKey::BrowserPrivate => Entry {
            macos: None,
            windows: None,
            linux: None,
            wsl: None,
        },
    }
}

fn to_app_name<S: ToString>(names: &[S]) -> AppName {
    match names {
        [single] => AppName::One(single.to_string()),
        many => AppName::Candidates(many.iter().map(ToString::to_string).collect()),
    }
}

/// Resolve `key` for an explicit environment. Pure function of the platform.
pub fn resolve_for(key: AppKey, env: &Environment) -> Result<AppName> {
    if key.is_sentinel() {
        return Ok(AppName::DefaultBrowser {
            private: key == AppKey::BrowserPrivate,
        });
    }

    let unsupported = || OpenError::UnsupportedPlatform {
        key: key.as_str().to_string(),
        platform: env.label(),
    };
    let entry = entry(key);

    if env.wsl {
        if let Some(binary) = &entry.wsl {
            let names = match binary {
                Binary::Any(names) => *names,
                Binary::PerArch { x86, x86_64 } => match env.arch {
                    Arch::X86 => *x86,
                    Arch::X86_64 => *x86_64,
                    _ => return Err(unsupported()),
                },
            };
            let mount = &env.wsl_mount_point;
            let paths: Vec<String> = names
                .iter()
                .map(|name| format!("{}{}", mount, name))
                .collect();
            return Ok(to_app_name(&paths));
        }
    }

    let names = match env.os {
        OsFamily::MacOs => entry.macos,
        OsFamily::Windows => entry.windows,
        OsFamily::Linux => entry.linux,
        OsFamily::Android | OsFamily::OtherUnix => None,
    };
    names.map(to_app_name).ok_or_else(unsupported)
}

struct Registry {
    env: Environment,
    entries: HashMap<AppKey, Option<AppName>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let env = Environment::detect();
        let entries = AppKey::ALL
            .into_iter()
            .map(|key| (key, resolve_for(key, &env).ok()))
            .collect();
        debug!("[Registry] Initialised for {}", env.label());
        Registry { env, entries }
    })
}

/// Resolve `key` on the running platform.
///
/// Sentinel keys (`browser`, `browserPrivate`) resolve to
/// [`AppName::DefaultBrowser`] and are expanded at launch time through
/// default-browser detection.
pub fn resolve(key: AppKey) -> Result<AppName> {
    let registry = registry();
    registry
        .entries
        .get(&key)
        .cloned()
        .flatten()
        .ok_or_else(|| OpenError::UnsupportedPlatform {
            key: key.as_str().to_string(),
            platform: registry.env.label(),
        })
}

/// App (and extra arguments) standing behind a browser sentinel.
pub fn resolve_default_browser(
    browser: &DefaultBrowser,
    private: bool,
    env: &Environment,
) -> Result<(AppName, Vec<String>)> {
    let key = AppKey::from_browser_id(&browser.id).ok_or_else(|| {
        OpenError::UnsupportedFeature(format!(
            "{} is not supported as a default browser",
            browser.name
        ))
    })?;

    let mut arguments = Vec::new();
    if private {
        let flag = key.private_flag().ok_or_else(|| {
            OpenError::UnsupportedFeature(format!(
                "{} has no known private-mode command-line flag",
                browser.name
            ))
        })?;
        arguments.push(flag.to_string());
    }

    Ok((resolve_for(key, env)?, arguments))
}
