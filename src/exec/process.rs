// src/exec/process.rs

//! Owning the tool process: start, kill, exit code.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, ToolTaskError};
use crate::exec::invocation::InvocationSpec;
use crate::output::queue::OutputQueues;
use crate::output::reader::spawn_reader;
use crate::types::KillScope;

/// Result of [`ProcessHandle::terminate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// Killed, and the OS confirmed the exit within the grace period.
    Killed,
    /// Killed, but the exit was not confirmed within the grace period.
    NotConfirmed,
    /// Nothing to do: the process had already exited, or was already
    /// terminated by an earlier call.
    AlreadyExited,
}

/// The running tool and its stream readers.
///
/// Dropping the handle kills the process (and its group, for
/// [`KillScope::Tree`]) if it is still alive, and stops the readers.
#[derive(Debug)]
pub struct ProcessHandle {
    tool: String,
    child: Child,
    pid: Option<u32>,
    readers: Vec<JoinHandle<()>>,
    kill_scope: KillScope,
    grace: Duration,
    exit_status: Option<ExitStatus>,
    terminated: bool,
}

impl ProcessHandle {
    /// Start the process described by `spec`, with stdin closed and
    /// stdout/stderr pumped into `queues`.
    pub fn start(spec: &InvocationSpec, tool: &str, queues: &OutputQueues) -> Result<Self> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &spec.working_directory {
            cmd.current_dir(dir);
        }
        for (name, value) in &spec.environment {
            cmd.env(name, value);
        }

        // Own process group, so the whole tree can be signalled at once.
        #[cfg(unix)]
        {
            if spec.kill_scope == KillScope::Tree {
                cmd.process_group(0);
            }
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ToolTaskError::launch_failed(tool, e))?;

        // Tools that prompt on stdin would otherwise hang forever.
        drop(child.stdin.take());

        let pid = child.id();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, spec.stdout_encoding, queues.stdout.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, spec.stderr_encoding, queues.stderr.clone()));
        }

        debug!(tool = %tool, pid = ?pid, program = %spec.program.display(), "process started");

        Ok(Self {
            tool: tool.to_string(),
            child,
            pid,
            readers,
            kill_scope: spec.kill_scope,
            grace: spec.termination_grace,
            exit_status: None,
            terminated: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Resolves when the process has exited. Cancel-safe.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }
        let status = self.child.wait().await?;
        self.exit_status = Some(status);
        Ok(status)
    }

    pub fn has_exited(&mut self) -> bool {
        if self.exit_status.is_some() {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status);
                true
            }
            _ => false,
        }
    }

    /// Wait (at most `window`) for both readers to reach end of stream.
    ///
    /// Returns `false` if a reader is still running, e.g. because a
    /// grandchild inherited the pipe and keeps it open.
    pub async fn join_readers(&mut self, window: Duration) -> bool {
        let mut readers = std::mem::take(&mut self.readers);
        let joined = tokio::time::timeout(window, async {
            for reader in readers.iter_mut() {
                let _ = reader.await;
            }
        })
        .await
        .is_ok();

        if !joined {
            for reader in &readers {
                reader.abort();
            }
        }
        joined
    }

    /// Kill the process (or its whole tree) and wait up to the grace period
    /// for the OS to confirm. Safe to call repeatedly: only the first call
    /// on a live process does anything.
    pub async fn terminate(&mut self) -> KillOutcome {
        if self.terminated || self.has_exited() {
            debug!(tool = %self.tool, "terminate requested but process already exited");
            return KillOutcome::AlreadyExited;
        }
        self.terminated = true;

        for reader in &self.readers {
            reader.abort();
        }

        info!(tool = %self.tool, pid = ?self.pid, scope = ?self.kill_scope, "killing tool process");
        self.kill();

        match tokio::time::timeout(self.grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                self.exit_status = Some(status);
                KillOutcome::Killed
            }
            Ok(Err(e)) => {
                warn!(tool = %self.tool, error = %e, "waiting for killed process failed");
                KillOutcome::NotConfirmed
            }
            Err(_) => {
                warn!(
                    tool = %self.tool,
                    grace_ms = u64::try_from(self.grace.as_millis()).unwrap_or(u64::MAX),
                    "killed process did not exit within the grace period"
                );
                KillOutcome::NotConfirmed
            }
        }
    }

    fn kill(&mut self) {
        if self.kill_scope == KillScope::Tree {
            self.kill_tree();
        }
        if let Err(e) = self.child.start_kill() {
            debug!(tool = %self.tool, error = %e, "start_kill failed");
        }
    }

    #[cfg(unix)]
    fn kill_tree(&self) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let Some(pgid) = self.pid.and_then(|pid| i32::try_from(pid).ok()) else {
            return;
        };
        if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            debug!(tool = %self.tool, pgid, error = %e, "killpg failed");
        }
    }

    #[cfg(not(unix))]
    fn kill_tree(&self) {
        debug!(tool = %self.tool, "process-tree kill unsupported here; killing the tool process only");
    }

    /// Raw exit code, or `-1` when there is no real one (still running,
    /// killed by a signal).
    pub fn exit_code(&mut self) -> i32 {
        self.has_exited();
        self.exit_status.and_then(|s| s.code()).unwrap_or(-1)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }

        // `kill_on_drop` only reaches the direct child; take the group with it
        // while the pid still names it (the child is unreaped).
        if !self.terminated && !self.has_exited() {
            debug!(tool = %self.tool, pid = ?self.pid, "process handle dropped while tool running");
            self.kill();
        }
    }
}
