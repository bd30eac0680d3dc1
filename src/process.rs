//! Child-process lifecycle for a language server
//!
//! Owns the spawned server and its stdio pipes. The write end stays with
//! the host so the initiating thread can send framed messages; the read
//! end is handed out at start for the reader loop to block on.

use std::io::Write;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::config::ServerConfig;
use crate::error::{LspError, Result};

/// Lifecycle state of the spawned server process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Owns one language-server child process and its pipes
pub struct ProcessHost {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    state: ProcessState,
}

impl Default for ProcessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost {
    pub fn new() -> Self {
        Self {
            child: None,
            stdin: None,
            state: ProcessState::Stopped,
        }
    }

    /// Spawn the server with piped stdio and hand back the read end.
    ///
    /// On failure the state stays `Stopped` and the host can be started
    /// again with a different config.
    pub fn start(&mut self, config: &ServerConfig) -> Result<ChildStdout> {
        if self.state != ProcessState::Stopped {
            return Err(LspError::AlreadyRunning);
        }
        self.state = ProcessState::Starting;

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // Server logs must not pollute the framed channel
            .stderr(Stdio::null());
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        tracing::info!("spawning language server: {} {:?}", config.command, config.args);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state = ProcessState::Stopped;
                return Err(LspError::Spawn {
                    command: config.command.clone(),
                    source: e,
                });
            }
        };

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                self.state = ProcessState::Stopped;
                return Err(LspError::Io(std::io::Error::other(
                    "child process has no stdio pipes",
                )));
            }
        };

        self.stdin = Some(stdin);
        self.child = Some(child);
        self.state = ProcessState::Running;
        Ok(stdout)
    }

    /// Blocking write of an already-framed message to the server's stdin
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(LspError::NotRunning)?;
        stdin.write_all(bytes)?;
        stdin.flush()?;
        Ok(())
    }

    /// True between a successful `start` and the matching `stop`
    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Terminate the child and close both pipe ends. Idempotent.
    ///
    /// The reader loop observes EOF on its pipe once the process is gone.
    pub fn stop(&mut self) {
        if self.state == ProcessState::Stopped {
            return;
        }
        self.state = ProcessState::Stopping;

        // Closing stdin first lets a well-behaved server exit on its own
        self.stdin = None;

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("kill after exit: {}", e);
            }
            match child.wait() {
                Ok(status) => tracing::debug!("language server exited: {}", status),
                Err(e) => tracing::warn!("failed to reap language server: {}", e),
            }
        }

        self.state = ProcessState::Stopped;
    }
}

impl Drop for ProcessHost {
    fn drop(&mut self) {
        // Best-effort cleanup if the owner never called stop()
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
