//! Runs configured commands with the raw webhook payload as their only argument

use chrono::{DateTime, Utc};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{error, info, warn};

/// How a single command run ended
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Succeeded { stdout: String },
    Failed { exit_code: Option<i32>, stderr: String },
    SpawnFailed { error: String },
    TimedOut { after: Duration },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded { .. })
    }
}

/// One command run for one matched rule. Logged, never stored.
#[derive(Debug, Clone)]
pub struct CommandExecution {
    pub rule: String,
    pub command: String,
    pub outcome: CommandOutcome,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl CommandExecution {
    pub fn log(&self) {
        match &self.outcome {
            CommandOutcome::Succeeded { stdout } => {
                info!(
                    "Executed: {} (rule '{}', {} ms)",
                    self.command,
                    self.rule,
                    self.duration.as_millis()
                );
                info!("Output: {}", stdout);
            }
            CommandOutcome::Failed { exit_code, stderr } => {
                error!(
                    "Command '{}' (rule '{}') failed with exit code {:?}:\n{}",
                    self.command, self.rule, exit_code, stderr
                );
            }
            CommandOutcome::SpawnFailed { error } => {
                error!(
                    "Command '{}' (rule '{}') failed to start: {}",
                    self.command, self.rule, error
                );
            }
            CommandOutcome::TimedOut { after } => {
                error!(
                    "Command '{}' (rule '{}') timed out after {}s and was killed",
                    self.command,
                    self.rule,
                    after.as_secs_f64()
                );
            }
        }
    }
}

/// Spawn `command` with `payload` as a single argument and wait for it, at most `timeout`.
/// The child leads its own process group; on timeout the whole group is killed.
pub async fn run_command(command: &str, payload: &[u8], timeout: Duration) -> CommandOutcome {
    let argument = String::from_utf8_lossy(payload);

    let child = Command::new(command)
        .arg(&*argument)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            return CommandOutcome::SpawnFailed {
                error: e.to_string(),
            };
        }
    };
    let pid = child.id();

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Err(_) => {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            CommandOutcome::TimedOut { after: timeout }
        }
        Ok(Err(e)) => CommandOutcome::Failed {
            exit_code: None,
            stderr: e.to_string(),
        },
        Ok(Ok(output)) if output.status.success() => CommandOutcome::Succeeded {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        },
        Ok(Ok(output)) => CommandOutcome::Failed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
    }
}

fn kill_process_group(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill process group {}: {}", pid, e),
    }
}

/// Run one command for `rule`, timing it and logging the outcome.
pub async fn execute(
    rule: &str,
    command: &str,
    payload: &[u8],
    timeout: Duration,
) -> CommandExecution {
    info!("Running '{}' for rule '{}'", command, rule);
    let started_at = Utc::now();
    let start = Instant::now();
    let outcome = run_command(command, payload, timeout).await;

    let execution = CommandExecution {
        rule: rule.to_string(),
        command: command.to_string(),
        outcome,
        started_at,
        duration: start.elapsed(),
    };
    execution.log();
    execution
}
