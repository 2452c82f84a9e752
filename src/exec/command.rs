// src/exec/command.rs

//! Shell command runner for external transforms.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::engine::{TaskFailure, TaskOutcome};

/// Run `cmd` through the platform shell with `cwd` as working directory.
///
/// Exit status 0 is success; anything else (including a signal) fails the
/// task. Spawn errors are logged and reported as `Exit(-1)`.
pub async fn run_command(task: &str, run_id: u64, cmd: &str, cwd: &Path) -> TaskOutcome {
    match run_command_inner(task, run_id, cmd, cwd).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(task = %task, run_id, error = %err, "task execution error");
            TaskOutcome::Failed(TaskFailure::Exit(-1))
        }
    }
}

async fn run_command_inner(task: &str, run_id: u64, cmd: &str, cwd: &Path) -> Result<TaskOutcome> {
    info!(task = %task, run_id, cmd = %cmd, "starting task process");

    let mut command = shell_command(cmd);
    command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    let stdout = child.stdout.take().map(|out| forward_lines(task, run_id, out, false));
    let stderr = child.stderr.take().map(|err| forward_lines(task, run_id, err, true));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    // Drain remaining output so the log is complete before we report.
    for handle in [stdout, stderr].into_iter().flatten() {
        let _ = handle.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task,
        run_id,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(TaskFailure::Exit(code))
    })
}

fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

fn forward_lines<R>(task: &str, run_id: u64, reader: R, is_stderr: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let task = task.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                warn!(task = %task, run_id, "stderr: {}", line);
            } else {
                info!(task = %task, run_id, "stdout: {}", line);
            }
        }
    })
}
