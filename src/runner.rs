use crate::models::{CommandOutput, CommandSpec};
use anyhow::{Context, Result};
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

/// Runs one external command to completion. The single seam between handlers
/// and the operating system — tests substitute a recording fake.
pub trait CommandRunner {
    fn run(&self, spec: CommandSpec) -> impl Future<Output = CommandOutput> + Send;
}

/// The real thing: spawns the process described by the spec, feeds stdin if
/// any, and collects both streams fully in memory. Callers are
/// human-triggered, bounded OSINT lookups, so no streaming and no size cap.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    /// Never fails: if the process cannot be created (binary missing,
    /// permission denied), the failure message becomes stderr with exit code
    /// 1, so every caller has one failure channel instead of two.
    async fn run(&self, spec: CommandSpec) -> CommandOutput {
        match spawn_and_wait(spec).await {
            Ok(output) => output,
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: e.to_string(),
                exit_code: 1,
            },
        }
    }
}

async fn spawn_and_wait(spec: CommandSpec) -> Result<CommandOutput> {
    let (program, args) = spec.argv.split_first().context("empty command line")?;

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // An interrupted server must not leave orphaned children behind.
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }
    cmd.stdin(if spec.stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = cmd.spawn().with_context(|| format!("spawning {program}"))?;
    if let Some(input) = &spec.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .context("writing to child stdin")?;
            // dropping the handle closes the stream
        }
    }

    let out = child.wait_with_output().await.context("waiting for child")?;
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        exit_code: out.status.code().unwrap_or(-1),
    })
}
