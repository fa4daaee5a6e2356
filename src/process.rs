//! Running the Tailwind CSS CLI and supervising long-lived processes.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::commands::CliInvocation;
use crate::errors::{Result, TailwindCliError};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Captured output of a finished build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run a one-shot build and capture its output.
///
/// A non-zero exit is a [`TailwindCliError::CommandFailed`] carrying the
/// captured stderr.
pub fn run_build(invocation: &CliInvocation) -> Result<BuildOutput> {
    debug!(command = %invocation, "Running Tailwind CSS build");

    let output = invocation
        .command()
        .stdin(Stdio::null())
        .output()
        .map_err(|e| TailwindCliError::CommandFailed {
            message: format!("Failed to start '{}'", invocation.program.display()),
            detail: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(TailwindCliError::CommandFailed {
            message: format!("Tailwind CSS build failed ({})", output.status),
            detail: stderr.trim().to_string(),
        });
    }

    Ok(BuildOutput { stdout, stderr })
}

/// Run the watcher until it exits or Ctrl-C is pressed.
pub async fn run_watch(invocation: &CliInvocation) -> Result<()> {
    let mut manager = ProcessManager::new();
    manager.spawn("tailwind watch", invocation.async_command())?;
    manager.supervise().await
}

struct ManagedChild {
    name: String,
    child: Child,
}

/// Supervises a set of child processes.
///
/// Supervision ends on Ctrl-C, when a child exits unsuccessfully, or when
/// every child has finished. Remaining children are stopped in all cases.
#[derive(Default)]
pub struct ProcessManager {
    children: Vec<ManagedChild>,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: impl Into<String>, mut command: Command) -> Result<()> {
        let name = name.into();
        command.kill_on_drop(true);

        let child = command.spawn().map_err(|e| TailwindCliError::CommandFailed {
            message: format!("Failed to start {}", name),
            detail: e.to_string(),
        })?;
        debug!(process = %name, pid = ?child.id(), "Started process");

        self.children.push(ManagedChild { name, child });
        Ok(())
    }

    /// Number of processes still being supervised
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub async fn supervise(mut self) -> Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while !self.children.is_empty() {
            if let Some((name, status)) = self.reap()? {
                if !status.success() {
                    warn!(process = %name, %status, "Process exited unsuccessfully");
                    self.stop_all().await;
                    return Err(TailwindCliError::CommandFailed {
                        message: format!("{} stopped", name),
                        detail: status.to_string(),
                    });
                }
                debug!(process = %name, "Process finished");
                continue;
            }

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl-C, stopping processes");
                    self.stop_all().await;
                    return Ok(());
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        Ok(())
    }

    /// Remove the first child that has exited, if any
    fn reap(&mut self) -> Result<Option<(String, ExitStatus)>> {
        for index in 0..self.children.len() {
            if let Some(status) = self.children[index].child.try_wait()? {
                let finished = self.children.remove(index);
                return Ok(Some((finished.name, status)));
            }
        }
        Ok(None)
    }

    async fn stop_all(&mut self) {
        for mut managed in self.children.drain(..) {
            if let Err(e) = managed.child.kill().await {
                debug!(process = %managed.name, error = %e, "Process already stopped");
            }
        }
    }
}
