//! Process runner: spawns a [`PlatformPlan`] and optionally waits for it.
//!
//! Two phases: `spawn` resolves once the OS has created the process and handed
//! back a pid, then (only with `wait`) the exit status is awaited.

use crate::error::{OpenError, Result};
use crate::plan::PlatformPlan;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::{debug, info};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// Windows flag to prevent console window from appearing
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Handle to a launched process.
///
/// Not waited: the child keeps running on its own and is reaped in the
/// background once it exits. Waited: the exit status is recorded.
#[derive(Debug)]
pub struct LaunchedProcess {
    command: String,
    pid: Option<u32>,
    child: Child,
    status: Option<ExitStatus>,
}

impl LaunchedProcess {
    /// OS process id, `None` if the process was already reaped.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Program that was spawned.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit status, once the process was waited for.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Wait for exit (returns immediately if already waited).
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let status = self.child.wait().await?;
        self.status = Some(status);
        Ok(status)
    }

    /// Terminate the process. There is no other way to cancel a launch.
    pub async fn kill(&mut self) -> Result<()> {
        if self.status.is_some() {
            return Ok(());
        }
        self.child.kill().await?;
        self.status = self.child.try_wait()?;
        Ok(())
    }
}

/// Spawn `plan` and, if it asks for it, wait for the exit.
pub async fn run(plan: &PlatformPlan) -> Result<LaunchedProcess> {
    let program = plan.program();
    let mut launched = spawn(plan, &program)?;

    if !plan.wait {
        return Ok(launched);
    }

    let status = launched.wait().await?;
    debug!("[Runner] {} exited with {}", program, status);

    if !status.success() && !plan.allow_nonzero_exit_code {
        return Err(OpenError::NonzeroExit {
            command: program,
            code: status.code(),
        });
    }
    Ok(launched)
}

fn spawn(plan: &PlatformPlan, program: &str) -> Result<LaunchedProcess> {
    let mut cmd = std::process::Command::new(&plan.command);
    cmd.args(&plan.args);

    if plan.suppress_stdio {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
    }

    #[cfg(unix)]
    if plan.detached {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    // On Windows, prevent console window from appearing
    #[cfg(windows)]
    if plan.hide_window {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    let child = Command::from(cmd)
        .spawn()
        .map_err(|source| OpenError::SpawnFailure {
            command: program.to_string(),
            source,
        })?;

    let pid = child.id();
    info!("[Runner] Spawned {} (pid {:?})", program, pid);

    Ok(LaunchedProcess {
        command: program.to_string(),
        pid,
        child,
        status: None,
    })
}
