//! Remote command execution against the desktop host.
//!
//! [`RemoteExecutor`] is the single capability the desktop tool needs: run one
//! command string on the target display and hand back trimmed stdout.
//! [`CommandExecutor`] implements it over `ssh` (or a local `sh -c` when no
//! host is configured), reading output through a bounded buffer.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::RemoteConfig;

/// Failure of a single remote command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read command output: {0}")]
    Io(#[from] std::io::Error),
    #[error("command exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("command wrote to stderr: {0}")]
    Diagnostic(String),
    #[error("command output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },
}

/// Runs one command against the remote display.
#[async_trait::async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Runs `command` to completion and returns its trimmed stdout.
    async fn exec(&self, command: &str) -> Result<String, ExecError>;
}

/// Where commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `sh -c` on this machine.
    Local,
    /// `ssh <host>`, non-interactive.
    Ssh { host: String },
}

/// Process-backed [`RemoteExecutor`].
pub struct CommandExecutor {
    target: Target,
    display: u32,
    max_output: usize,
}

impl CommandExecutor {
    pub fn new(target: Target, display: u32, max_output: usize) -> Self {
        Self {
            target,
            display,
            max_output,
        }
    }

    /// Builds an executor from the `[remote]` config section.
    pub fn from_config(remote: &RemoteConfig) -> Self {
        let target = match remote.host.as_deref().filter(|h| !h.is_empty()) {
            Some(host) => Target::Ssh {
                host: host.to_string(),
            },
            None => Target::Local,
        };
        Self::new(target, remote.display_number, remote.max_output_bytes)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn command(&self, command: &str) -> (String, tokio::process::Command) {
        match &self.target {
            Target::Local => {
                let mut cmd = tokio::process::Command::new("sh");
                cmd.arg("-c")
                    .arg(command)
                    .env("DISPLAY", format!(":{}", self.display));
                ("sh".to_string(), cmd)
            }
            Target::Ssh { host } => {
                let mut cmd = tokio::process::Command::new("ssh");
                cmd.arg("-o")
                    .arg("BatchMode=yes")
                    .arg(host)
                    .arg(format!("DISPLAY=:{} {}", self.display, command));
                ("ssh".to_string(), cmd)
            }
        }
    }
}

/// Reads at most `limit + 1` bytes so an overflow is detectable without
/// buffering the whole stream.
async fn read_bounded<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader
            .take(limit as u64 + 1)
            .read_to_end(&mut buf)
            .await?;
    }
    Ok(buf)
}

#[async_trait::async_trait]
impl RemoteExecutor for CommandExecutor {
    async fn exec(&self, command: &str) -> Result<String, ExecError> {
        let (program, mut cmd) = self.command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(via = ?self.target, display = self.display, %command, "remote exec");

        let mut child = cmd
            .spawn()
            .map_err(|source| ExecError::Spawn { program, source })?;

        let (stdout, stderr) = tokio::join!(
            read_bounded(child.stdout.take(), self.max_output),
            read_bounded(child.stderr.take(), self.max_output),
        );
        let (stdout, stderr) = (stdout?, stderr?);

        if stdout.len() > self.max_output {
            child.start_kill().ok();
            return Err(ExecError::OutputTooLarge {
                limit: self.max_output,
            });
        }

        let status = child.wait().await?;
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            tracing::warn!(code, %stderr, %command, "remote command failed");
            return Err(ExecError::NonZeroExit { code, stderr });
        }
        if !stderr.is_empty() {
            tracing::warn!(%stderr, %command, "remote command wrote to stderr");
            return Err(ExecError::Diagnostic(stderr));
        }

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}
