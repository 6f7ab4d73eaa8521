//! Optional command run over a finished report.
//!
//! The command is started through `sh -c` with the report on stdin and the
//! run metadata in the environment. Its outcome is logged and never changes
//! the result of the run.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::CompletedRun;
use crate::config::OutputConfig;

pub const TASK_ID_ENV: &str = "MEETSCRIBE_TASK_ID";
pub const AUDIO_PATH_ENV: &str = "MEETSCRIBE_AUDIO_PATH";
pub const REPORT_PATH_ENV: &str = "MEETSCRIBE_REPORT_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostRunStatus {
    Succeeded,
    /// Non-zero exit; `None` when the command was killed by a signal.
    Exited(Option<i32>),
    /// The command was killed after exceeding its time limit.
    TimedOut,
    /// The command could not be spawned or waited on.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PostRunCommand {
    command: String,
    timeout: Duration,
}

impl PostRunCommand {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// `None` when no command is configured.
    pub fn from_config(output: &OutputConfig) -> Option<Self> {
        let command = output.post_command.trim();
        if command.is_empty() {
            return None;
        }
        Some(Self::new(
            command,
            Duration::from_secs(output.post_command_timeout_seconds),
        ))
    }

    pub async fn run(&self, run: &CompletedRun, audio_path: &Path) -> PostRunStatus {
        info!("Running post-run command: {}", self.command);

        let spawned = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(TASK_ID_ENV, &run.task_id)
            .env(AUDIO_PATH_ENV, audio_path)
            .env(REPORT_PATH_ENV, &run.report_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!("Post-run command could not start: {}", e);
                return PostRunStatus::Failed(e.to_string());
            }
        };

        // Fed from its own task so a command that never reads stdin cannot
        // hold the run past the time limit.
        let feeder = child.stdin.take().map(|mut stdin| {
            let report = run.report.clone().into_bytes();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&report).await {
                    debug!("Post-run command closed stdin early: {}", e);
                }
            })
        });

        let status = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
                    info!("post-run: {}", line);
                }
                if output.status.success() {
                    PostRunStatus::Succeeded
                } else {
                    warn!(
                        "Post-run command exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                    PostRunStatus::Exited(output.status.code())
                }
            }
            Ok(Err(e)) => {
                warn!("Post-run command failed: {}", e);
                PostRunStatus::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Post-run command killed after {}s",
                    self.timeout.as_secs_f64()
                );
                PostRunStatus::TimedOut
            }
        };

        if let Some(feeder) = feeder {
            feeder.abort();
        }
        status
    }
}
