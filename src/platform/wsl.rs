//! WSL (Windows Subsystem for Linux) helpers.
//!
//! Detects WSL, finds where Windows drives are mounted, locates the Windows
//! PowerShell executable and converts Linux paths to Windows paths.

use crate::error::{OpenError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Mount point used when `/etc/wsl.conf` does not set `[automount] root`.
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/";

const WSL_CONF: &str = "/etc/wsl.conf";

const POWERSHELL_SUBPATH: &str = "c/Windows/System32/WindowsPowerShell/v1.0/powershell.exe";

/// Check if we run inside WSL.
///
/// Reads `/proc/version` looking for "microsoft" or "WSL".
pub fn is_wsl() -> bool {
    if let Ok(version) = std::fs::read_to_string("/proc/version") {
        let version_lower = version.to_lowercase();
        return version_lower.contains("microsoft") || version_lower.contains("wsl");
    }
    false
}

/// Mount point of the Windows drives, always ending in `/`.
pub fn drives_mount_point() -> String {
    let mount = std::fs::read_to_string(WSL_CONF)
        .ok()
        .and_then(|conf| parse_mount_point(&conf));

    match mount {
        Some(mount) => {
            info!("[WSL] Drives mounted at {} (from {})", mount, WSL_CONF);
            mount
        }
        None => DEFAULT_MOUNT_POINT.to_string(),
    }
}

/// Extract `root = ...` from a wsl.conf body, ignoring commented lines.
fn parse_mount_point(conf: &str) -> Option<String> {
    conf.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "root")
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
        .map(|mut value| {
            if !value.ends_with('/') {
                value.push('/');
            }
            value
        })
}

/// Windows PowerShell as seen from inside WSL.
pub fn powershell_path(mount_point: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", mount_point, POWERSHELL_SUBPATH))
}

/// Windows PowerShell on native Windows.
pub fn native_powershell_path() -> PathBuf {
    let system_root = std::env::var("SYSTEMROOT").unwrap_or_else(|_| r"C:\Windows".to_string());
    PathBuf::from(format!(
        r"{}\System32\WindowsPowerShell\v1.0\powershell",
        system_root
    ))
}

/// Whether `path` points into the Windows drives mounted under WSL.
pub fn is_mounted_windows_path(path: &str, mount_point: &str) -> bool {
    path.starts_with(mount_point)
}

/// Converts WSL paths to Windows paths.
pub trait PathConverter: Send + Sync {
    fn to_windows_path(&self, path: &Path) -> Result<String>;
}

/// [`PathConverter`] backed by `wslpath -w`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Wslpath;

impl PathConverter for Wslpath {
    fn to_windows_path(&self, path: &Path) -> Result<String> {
        let output = Command::new("wslpath")
            .arg("-w")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| OpenError::SpawnFailure {
                command: "wslpath".to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(OpenError::NonzeroExit {
                command: "wslpath".to_string(),
                code: output.status.code(),
            });
        }

        let converted = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("[WSL] {} -> {}", path.display(), converted);
        Ok(converted)
    }
}
