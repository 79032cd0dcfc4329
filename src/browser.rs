//! Default browser detection.
//!
//! - **macOS**: LaunchServices handler for `http`/`https` (`defaults read`)
//! - **Linux**: `xdg-mime query default x-scheme-handler/http`
//! - **Windows / WSL**: `UserChoice` ProgId of the `http` association (`reg query`)

use crate::error::{OpenError, Result};
use crate::platform::{Environment, OsFamily};
use std::process::{Command, Stdio};
use tracing::debug;

/// Identifier (bundle id, `.desktop` file or equivalent) and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultBrowser {
    pub id: String,
    pub name: String,
}

/// Anything that can tell which browser is the system default.
pub trait BrowserDetector: Send + Sync {
    fn detect(&self) -> Result<DefaultBrowser>;
}

/// Detector querying the host OS.
#[derive(Debug, Clone)]
pub struct SystemBrowserDetector {
    os: OsFamily,
    wsl: bool,
}

impl SystemBrowserDetector {
    pub fn new(env: &Environment) -> Self {
        Self {
            os: env.os,
            wsl: env.wsl,
        }
    }
}

const HTTP_USER_CHOICE: &str =
    r"HKEY_CURRENT_USER\Software\Microsoft\Windows\Shell\Associations\UrlAssociations\http\UserChoice";

impl BrowserDetector for SystemBrowserDetector {
    fn detect(&self) -> Result<DefaultBrowser> {
        let browser = match self.os {
            OsFamily::MacOs => {
                let output = run_query(
                    "defaults",
                    &[
                        "read",
                        "com.apple.LaunchServices/com.apple.launchservices.secure",
                        "LSHandlers",
                    ],
                )?;
                let id = parse_launch_services(&output)
                    .unwrap_or_else(|| "com.apple.Safari".to_string());
                from_id(id)
            }
            OsFamily::Windows => windows_browser(&run_query(
                "reg",
                &["query", HTTP_USER_CHOICE, "/v", "ProgId"],
            )?)?,
            OsFamily::Linux if self.wsl => windows_browser(&run_query(
                "reg.exe",
                &["query", HTTP_USER_CHOICE, "/v", "ProgId"],
            )?)?,
            OsFamily::Linux | OsFamily::Android | OsFamily::OtherUnix => {
                let output = run_query("xdg-mime", &["query", "default", "x-scheme-handler/http"])?;
                let id = output.trim();
                if id.is_empty() {
                    return Err(OpenError::UnsupportedFeature(
                        "no default browser is configured".to_string(),
                    ));
                }
                from_id(id.to_string())
            }
        };
        debug!("[Browser] Default browser: {:?}", browser);
        Ok(browser)
    }
}

fn run_query(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| OpenError::SpawnFailure {
            command: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(OpenError::NonzeroExit {
            command: program.to_string(),
            code: output.status.code(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn from_id(id: String) -> DefaultBrowser {
    let name = display_name(&id);
    DefaultBrowser { id, name }
}

fn display_name(id: &str) -> String {
    let known = match id.to_lowercase().as_str() {
        "com.google.chrome" | "google-chrome.desktop" => Some("Chrome"),
        "org.mozilla.firefox" | "firefox.desktop" => Some("Firefox"),
        "com.microsoft.msedge" | "com.microsoft.edge" | "microsoft-edge.desktop" => Some("Edge"),
        "com.brave.browser" | "brave-browser.desktop" => Some("Brave"),
        "com.apple.safari" => Some("Safari"),
        "com.microsoft.ie" => Some("Internet Explorer"),
        _ => None,
    };
    match known {
        Some(name) => name.to_string(),
        None => id
            .trim_end_matches(".desktop")
            .rsplit('.')
            .next()
            .unwrap_or(id)
            .to_string(),
    }
}

/// Bundle id of the `http`/`https` handler in `defaults read ... LSHandlers` output.
fn parse_launch_services(output: &str) -> Option<String> {
    output.split('}').find_map(|block| {
        let handles_http = block.lines().any(|line| {
            let line = line.trim().trim_end_matches(';');
            line == "LSHandlerURLScheme = http" || line == "LSHandlerURLScheme = https"
        });
        if !handles_http {
            return None;
        }
        block.lines().find_map(|line| {
            let value = line.trim().strip_prefix("LSHandlerRoleAll = ")?;
            let value = value.trim_end_matches(';').trim_matches('"');
            (!value.is_empty() && value != "-").then(|| value.to_string())
        })
    })
}

/// Map the `reg query` output for the http UserChoice to a browser.
fn windows_browser(output: &str) -> Result<DefaultBrowser> {
    let prog_id = output
        .lines()
        .find_map(|line| {
            let mut parts = line.split_whitespace();
            (parts.next() == Some("ProgId") && parts.next() == Some("REG_SZ"))
                .then(|| parts.collect::<Vec<_>>().join(" "))
        })
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            OpenError::UnsupportedFeature("cannot read the default browser ProgId".to_string())
        })?;

    let id = match prog_id.as_str() {
        "ChromeHTML" => "com.google.chrome",
        "MSEdgeHTM" | "AppXq0fevzme2pys62n3e0fbqa7peapykr8v" => "com.microsoft.edge",
        "BraveHTML" => "com.brave.Browser",
        "IE.HTTP" => "com.microsoft.ie",
        other if other.starts_with("FirefoxURL") => "org.mozilla.firefox",
        other => {
            return Ok(DefaultBrowser {
                id: other.to_string(),
                name: other.to_string(),
            })
        }
    };
    Ok(from_id(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_launch_services() {
        let output = r#"(
        {
        LSHandlerContentType = "public.html";
        LSHandlerRoleAll = "com.apple.safari";
    },
        {
        LSHandlerPreferredVersions =         {
            LSHandlerRoleAll = "-";
        };
        LSHandlerRoleAll = "org.mozilla.firefox";
        LSHandlerURLScheme = https;
    }
)"#;
        assert_eq!(
            parse_launch_services(output).as_deref(),
            Some("org.mozilla.firefox")
        );
        assert_eq!(parse_launch_services("()"), None);
    }

    #[test]
    fn test_windows_prog_ids() {
        let output = "\r\nHKEY_CURRENT_USER\\...\\UserChoice\r\n    ProgId    REG_SZ    ChromeHTML\r\n\r\n";
        let browser = windows_browser(output).unwrap();
        assert_eq!(browser.id, "com.google.chrome");
        assert_eq!(browser.name, "Chrome");

        let firefox = windows_browser("    ProgId    REG_SZ    FirefoxURL-308046B0AF4A39CB").unwrap();
        assert_eq!(firefox.id, "org.mozilla.firefox");

        let other = windows_browser("    ProgId    REG_SZ    OperaStable").unwrap();
        assert_eq!(other.id, "OperaStable");

        assert!(windows_browser("nothing here").is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("firefox.desktop"), "Firefox");
        assert_eq!(display_name("com.apple.Safari"), "Safari");
        assert_eq!(display_name("org.gnome.Epiphany.desktop"), "Epiphany");
    }
}
