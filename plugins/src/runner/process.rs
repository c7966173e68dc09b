use anyhow::{Context, Result};
use async_trait::async_trait;
use evalcmp_core::runner::{RunOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

/// Spawns the scorer as a child process with piped stdout/stderr.
pub struct ProcessRunnerPlugin {}

impl ProcessRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for ProcessRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .envs(&args.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = args.cwd.as_deref().filter(|d| !d.is_empty()) {
            cmd.current_dir(dir);
        }
        let child = cmd
            .spawn()
            .with_context(|| format!("spawn {} failed", args.cmd))?;

        tracing::debug!(target: "evalcmp.runner", pid = ?child.id(), cmd = %args.cmd, "scorer spawned");
        Ok(Box::new(ProcessRunnerSession { child }))
    }
}

struct ProcessRunnerSession {
    child: Child,
}

#[async_trait]
impl RunnerSession for ProcessRunnerSession {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> Result<()> {
        match signal {
            Signal::Kill => {
                self.child.start_kill().context("SIGKILL failed")?;
            }
            Signal::Term => self.terminate()?,
        }
        Ok(())
    }

    async fn wait(&mut self) -> Result<RunOutcome> {
        let status = self.child.wait().await?;
        Ok(RunOutcome {
            exit_code: exit_code(&status),
            duration_ms: None,
        })
    }
}

impl ProcessRunnerSession {
    #[cfg(unix)]
    fn terminate(&mut self) -> Result<()> {
        use nix::sys::signal::{kill, Signal as NixSignal};
        use nix::unistd::Pid;

        // already reaped
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        kill(Pid::from_raw(pid as i32), NixSignal::SIGTERM)
            .with_context(|| format!("SIGTERM failed for pid={pid}"))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<()> {
        // No polite stop on this platform.
        self.child.start_kill().context("terminate failed")?;
        Ok(())
    }
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
