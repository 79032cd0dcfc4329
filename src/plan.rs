//! Command builder: turns a [`LaunchRequest`] into the exact process to spawn.

use crate::options::LaunchRequest;
use crate::platform::{Environment, OsFamily, Strategy};
use crate::powershell;
use std::path::{Path, PathBuf};

/// Name of the freedesktop opener.
pub const XDG_OPEN: &str = "xdg-open";

/// The process to spawn for one launch attempt. Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPlan {
    pub command: PathBuf,
    pub args: Vec<String>,
    /// Start in its own process group so it outlives us
    pub detached: bool,
    /// Redirect stdin/stdout/stderr to null
    pub suppress_stdio: bool,
    /// Windows: do not flash a console window
    pub hide_window: bool,
    pub wait: bool,
    pub allow_nonzero_exit_code: bool,
}

impl PlatformPlan {
    fn new(command: impl Into<PathBuf>, request: &LaunchRequest) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            detached: false,
            suppress_stdio: false,
            hide_window: false,
            wait: request.wait,
            allow_nonzero_exit_code: request.allow_nonzero_exit_code,
        }
    }

    /// Command name for logs and errors.
    pub fn program(&self) -> String {
        self.command.display().to_string()
    }
}

/// Build the plan for `request` under `strategy`.
///
/// `opener` is the POSIX fallback used when no app is named.
pub fn build(strategy: &Strategy, request: &LaunchRequest, opener: &Path) -> PlatformPlan {
    match strategy {
        Strategy::MacOs => build_macos(request),
        Strategy::Windows { shell, wsl } => build_windows(shell, *wsl, request),
        Strategy::Posix => build_posix(request, opener),
    }
}

fn build_macos(request: &LaunchRequest) -> PlatformPlan {
    let mut plan = PlatformPlan::new("open", request);

    if request.wait {
        plan.args.push("--wait-apps".to_string());
    }
    if request.background {
        plan.args.push("--background".to_string());
    }
    if request.new_instance {
        plan.args.push("--new".to_string());
    }
    if let Some(app) = &request.app {
        plan.args.push("-a".to_string());
        plan.args.push(app.clone());
    }
    if let Some(target) = &request.target {
        plan.args.push(target.clone());
    }
    if !request.arguments.is_empty() {
        plan.args.push("--args".to_string());
        plan.args.extend(request.arguments.iter().cloned());
    }
    plan
}

fn build_windows(shell: &Path, wsl: bool, request: &LaunchRequest) -> PlatformPlan {
    let mut plan = PlatformPlan::new(shell, request);
    plan.args = powershell::FIXED_ARGS.iter().map(|s| s.to_string()).collect();
    plan.args.push(powershell::encode_command(&windows_script(request)));
    plan.hide_window = !wsl;
    plan
}

/// PowerShell script run by the Windows strategy, before encoding.
pub(crate) fn windows_script(request: &LaunchRequest) -> String {
    let mut parts = vec![powershell::PREAMBLE.to_string(), "Start".to_string()];

    if request.wait {
        parts.push("-Wait".to_string());
    }

    let target = request.target.as_deref().map(powershell::escape_ampersands);
    let mut app_arguments: Vec<String> = Vec::new();

    match (&request.app, target) {
        (Some(app), target) => {
            parts.push(powershell::quote_nested(app));
            // With an app, the target becomes its first argument
            app_arguments.extend(target);
        }
        (None, Some(target)) => parts.push(powershell::quote(&target)),
        (None, None) => {}
    }
    app_arguments.extend(request.arguments.iter().cloned());

    if !app_arguments.is_empty() {
        parts.push("-ArgumentList".to_string());
        let list: Vec<String> = app_arguments
            .iter()
            .map(|arg| powershell::quote_nested(arg))
            .collect();
        parts.push(list.join(","));
    }

    parts.join(" ")
}

fn build_posix(request: &LaunchRequest, opener: &Path) -> PlatformPlan {
    let command = match &request.app {
        Some(app) => PathBuf::from(app),
        None => opener.to_path_buf(),
    };
    let mut plan = PlatformPlan::new(command, request);

    plan.args.extend(request.arguments.iter().cloned());
    if let Some(target) = &request.target {
        plan.args.push(target.clone());
    }

    if !request.wait {
        // xdg-open blocks on inherited stdio and gets reaped with us unless detached
        plan.detached = true;
        plan.suppress_stdio = true;
    }
    plan
}

/// Pick the opener used on POSIX when no app is named.
///
/// Order: configured path, bundled `xdg-open` beside the executable,
/// `xdg-open` from PATH. Android and bundles without a real executable
/// path always use the one from PATH.
pub fn posix_opener(env: &Environment, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    if env.os != OsFamily::Android {
        if let Some(bundled) = env.exe_dir.as_deref().map(|dir| dir.join(XDG_OPEN)) {
            if is_executable(&bundled) {
                return bundled;
            }
        }
    }
    PathBuf::from(XDG_OPEN)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::tests::{env, wsl_env};

    fn request(target: Option<&str>, app: Option<&str>, arguments: &[&str]) -> LaunchRequest {
        LaunchRequest {
            target: target.map(str::to_string),
            app: app.map(str::to_string),
            default_browser: None,
            arguments: arguments.iter().map(|s| s.to_string()).collect(),
            wait: false,
            background: false,
            new_instance: false,
            allow_nonzero_exit_code: false,
        }
    }

    fn decode(encoded: &str) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        let bytes = STANDARD.decode(encoded).unwrap();
        let units: Vec<u16> = bytes
            .chunks(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).unwrap()
    }

    #[test]
    fn test_macos_flags_and_args_after_target() {
        let mut req = request(Some("https://x.test"), Some("google chrome"), &["--incognito"]);
        req.wait = true;
        req.background = true;
        req.new_instance = true;

        let plan = build(&Strategy::MacOs, &req, Path::new(XDG_OPEN));
        assert_eq!(plan.command, PathBuf::from("open"));
        assert_eq!(
            plan.args,
            [
                "--wait-apps",
                "--background",
                "--new",
                "-a",
                "google chrome",
                "https://x.test",
                "--args",
                "--incognito"
            ]
        );
        let target_pos = plan.args.iter().position(|a| a == "https://x.test").unwrap();
        let sep_pos = plan.args.iter().position(|a| a == "--args").unwrap();
        assert!(target_pos < sep_pos);
    }

    #[test]
    fn test_macos_without_app_arguments_has_no_separator() {
        let plan = build(
            &Strategy::MacOs,
            &request(Some("a.png"), None, &[]),
            Path::new(XDG_OPEN),
        );
        assert_eq!(plan.args, ["a.png"]);
        assert!(!plan.detached);
    }

    #[test]
    fn test_posix_app_arguments_precede_target() {
        let plan = build(
            &Strategy::Posix,
            &request(Some("https://x.test"), Some("firefox"), &["--private-window"]),
            Path::new(XDG_OPEN),
        );
        assert_eq!(plan.command, PathBuf::from("firefox"));
        assert_eq!(plan.args, ["--private-window", "https://x.test"]);
        assert!(plan.detached);
        assert!(plan.suppress_stdio);
    }

    #[test]
    fn test_posix_wait_keeps_stdio_attached() {
        let mut req = request(Some("a.txt"), None, &[]);
        req.wait = true;
        let plan = build(&Strategy::Posix, &req, Path::new("/opt/xdg-open"));
        assert_eq!(plan.command, PathBuf::from("/opt/xdg-open"));
        assert!(!plan.detached);
        assert!(!plan.suppress_stdio);
        assert!(plan.wait);
    }

    #[test]
    fn test_windows_escapes_ampersand_in_target() {
        let script = windows_script(&request(Some("https://x.test/?a=1&b=2"), None, &[]));
        assert!(script.contains("^&"));
        assert!(!script.contains("1&b"));
        assert_eq!(
            script,
            "$ProgressPreference = 'SilentlyContinue'; Start \"https://x.test/?a=1^&b=2\""
        );
    }

    #[test]
    fn test_windows_app_takes_target_as_argument() {
        let mut req = request(Some("https://x.test"), Some("chrome"), &["--incognito"]);
        req.wait = true;
        let script = windows_script(&req);
        assert_eq!(
            script,
            "$ProgressPreference = 'SilentlyContinue'; Start -Wait \"`\"chrome`\"\" \
             -ArgumentList \"`\"https://x.test`\"\",\"`\"--incognito`\"\""
        );
    }

    #[test]
    fn test_windows_plan_is_encoded_powershell_call() {
        let strategy = Strategy::select(&env(OsFamily::Windows));
        let req = request(Some("C:\\a b.txt"), None, &[]);
        let plan = build(&strategy, &req, Path::new(XDG_OPEN));

        assert!(plan.program().ends_with("powershell"));
        assert_eq!(&plan.args[..5], powershell::FIXED_ARGS);
        assert_eq!(plan.args.len(), 6);
        assert_eq!(decode(&plan.args[5]), windows_script(&req));
        assert!(plan.hide_window);
    }

    #[test]
    fn test_wsl_plan_uses_mounted_powershell() {
        let strategy = Strategy::select(&wsl_env());
        let plan = build(&strategy, &request(Some("x"), None, &[]), Path::new(XDG_OPEN));
        assert!(plan.program().ends_with("powershell.exe"));
        assert!(!plan.hide_window);
    }

    #[test]
    fn test_open_app_without_target() {
        let script = windows_script(&request(None, Some("brave"), &[]));
        assert_eq!(
            script,
            "$ProgressPreference = 'SilentlyContinue'; Start \"`\"brave`\"\""
        );

        let plan = build(
            &Strategy::Posix,
            &request(None, Some("brave"), &["--incognito"]),
            Path::new(XDG_OPEN),
        );
        assert_eq!(plan.args, ["--incognito"]);
    }

    #[test]
    fn test_posix_opener_selection() {
        let linux = env(OsFamily::Linux);
        assert_eq!(posix_opener(&linux, None), PathBuf::from(XDG_OPEN));
        assert_eq!(
            posix_opener(&linux, Some(Path::new("/usr/local/bin/opener"))),
            PathBuf::from("/usr/local/bin/opener")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_posix_opener_prefers_bundled_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::TempDir::new().unwrap();
        let bundled = dir.path().join(XDG_OPEN);
        std::fs::write(&bundled, "#!/bin/sh\n").unwrap();

        let mut linux = env(OsFamily::Linux);
        linux.exe_dir = Some(dir.path().to_path_buf());

        // Not executable yet
        assert_eq!(posix_opener(&linux, None), PathBuf::from(XDG_OPEN));

        std::fs::set_permissions(&bundled, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(posix_opener(&linux, None), bundled);

        let android = Environment {
            os: OsFamily::Android,
            ..linux
        };
        assert_eq!(posix_opener(&android, None), PathBuf::from(XDG_OPEN));
    }
}
