//! Host environment probing and launch strategy selection.
//!
//! [`Environment::detect`] gathers the facts once; [`Strategy::select`] is a pure
//! lookup over them so every branch can be tested on any host.

pub mod wsl;

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Operating system family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    MacOs,
    Windows,
    Linux,
    Android,
    /// BSDs and other Unix-likes
    OtherUnix,
}

impl OsFamily {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "android" => Self::Android,
            _ => Self::OtherUnix,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Android => "android",
            Self::OtherUnix => std::env::consts::OS,
        };
        f.write_str(name)
    }
}

/// CPU architecture, only as fine-grained as the app registry needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    Aarch64,
    Other,
}

impl Arch {
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            "aarch64" => Self::Aarch64,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Other => std::env::consts::ARCH,
        };
        f.write_str(name)
    }
}

/// Facts about the host that decide how a target gets opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub os: OsFamily,
    pub arch: Arch,
    /// Linux running under Windows Subsystem for Linux
    pub wsl: bool,
    /// Windows PowerShell can be executed from here
    pub powershell_reachable: bool,
    /// Inside a Docker/Podman style container
    pub container: bool,
    /// Logged in over SSH
    pub remote_shell: bool,
    /// WSL mount point for Windows drives (e.g. `/mnt/`)
    pub wsl_mount_point: String,
    /// Directory holding the running executable, when it has a real path
    pub exe_dir: Option<PathBuf>,
}

impl Environment {
    /// Probe the running host.
    pub fn detect() -> Self {
        let os = OsFamily::current();
        let is_wsl = os == OsFamily::Linux && wsl::is_wsl();
        let wsl_mount_point = if is_wsl {
            wsl::drives_mount_point()
        } else {
            wsl::DEFAULT_MOUNT_POINT.to_string()
        };
        let powershell_reachable = match os {
            OsFamily::Windows => true,
            OsFamily::Linux if is_wsl => wsl::powershell_path(&wsl_mount_point).exists(),
            _ => false,
        };

        let env = Self {
            os,
            arch: Arch::current(),
            wsl: is_wsl,
            powershell_reachable,
            container: is_container(),
            remote_shell: is_remote_shell(),
            wsl_mount_point,
            exe_dir: current_exe_dir(),
        };
        debug!("[Platform] Detected environment: {:?}", env);
        env
    }

    /// Human readable platform label used in error messages.
    pub fn label(&self) -> String {
        if self.wsl {
            format!("wsl ({})", self.arch)
        } else {
            format!("{} ({})", self.os, self.arch)
        }
    }
}

/// Check whether we run inside a container.
///
/// Looks for `/.dockerenv`, `/run/.containerenv` and a docker/podman cgroup.
pub fn is_container() -> bool {
    if Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists() {
        return true;
    }
    std::fs::read_to_string("/proc/self/cgroup")
        .map(|cgroup| cgroup.contains("docker") || cgroup.contains("libpod"))
        .unwrap_or(false)
}

fn is_remote_shell() -> bool {
    ["SSH_CONNECTION", "SSH_CLIENT", "SSH_TTY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

fn current_exe_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    // Bundled/sandboxed binaries can report "/" or an empty path
    if dir.as_os_str().is_empty() || dir == Path::new("/") {
        return None;
    }
    Some(dir.to_path_buf())
}

/// Which launcher family builds the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// `open` on macOS
    MacOs,
    /// PowerShell `Start`, native Windows or WSL with a reachable Windows shell
    Windows { shell: PathBuf, wsl: bool },
    /// App binary or the `xdg-open` style opener
    Posix,
}

impl Strategy {
    /// Pick exactly one strategy for the given environment.
    pub fn select(env: &Environment) -> Self {
        match env.os {
            OsFamily::MacOs => Self::MacOs,
            OsFamily::Windows => Self::Windows {
                shell: wsl::native_powershell_path(),
                wsl: false,
            },
            OsFamily::Linux
                if env.wsl && env.powershell_reachable && !env.container && !env.remote_shell =>
            {
                Self::Windows {
                    shell: wsl::powershell_path(&env.wsl_mount_point),
                    wsl: true,
                }
            }
            _ => Self::Posix,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Windows { wsl: true, .. } => "wsl",
            Self::Windows { .. } => "windows",
            Self::Posix => "posix",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn env(os: OsFamily) -> Environment {
        Environment {
            os,
            arch: Arch::X86_64,
            wsl: false,
            powershell_reachable: os == OsFamily::Windows,
            container: false,
            remote_shell: false,
            wsl_mount_point: "/mnt/".to_string(),
            exe_dir: None,
        }
    }

    pub(crate) fn wsl_env() -> Environment {
        Environment {
            wsl: true,
            powershell_reachable: true,
            ..env(OsFamily::Linux)
        }
    }

    #[test]
    fn test_select_by_os_family() {
        assert_eq!(Strategy::select(&env(OsFamily::MacOs)), Strategy::MacOs);
        assert_eq!(Strategy::select(&env(OsFamily::Linux)), Strategy::Posix);
        assert_eq!(Strategy::select(&env(OsFamily::Android)), Strategy::Posix);
        assert_eq!(Strategy::select(&env(OsFamily::OtherUnix)), Strategy::Posix);
        assert!(matches!(
            Strategy::select(&env(OsFamily::Windows)),
            Strategy::Windows { wsl: false, .. }
        ));
    }

    #[test]
    fn test_wsl_uses_windows_shell_from_mount_point() {
        match Strategy::select(&wsl_env()) {
            Strategy::Windows { shell, wsl } => {
                assert!(wsl);
                assert_eq!(
                    shell,
                    PathBuf::from("/mnt/c/Windows/System32/WindowsPowerShell/v1.0/powershell.exe")
                );
            }
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_wsl_falls_back_to_posix() {
        let unreachable = Environment {
            powershell_reachable: false,
            ..wsl_env()
        };
        assert_eq!(Strategy::select(&unreachable), Strategy::Posix);

        let container = Environment {
            container: true,
            ..wsl_env()
        };
        assert_eq!(Strategy::select(&container), Strategy::Posix);

        let ssh = Environment {
            remote_shell: true,
            ..wsl_env()
        };
        assert_eq!(Strategy::select(&ssh), Strategy::Posix);
    }

    #[test]
    fn test_detect_does_not_panic() {
        let env = Environment::detect();
        assert_eq!(env.os, OsFamily::current());
        assert!(!env.label().is_empty());
    }
}
