use std::fmt;
use std::process::Stdio;

use cf_core::{FabricError, Result};
use futures::future::BoxFuture;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured stdout/stderr of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs shell-form commands locally or on a remote host (SPEC_FULL.md 4.A).
/// A trait rather than a concrete struct because tests substitute a
/// recording fake for the real process-spawning implementation.
pub trait HostExecutor: Send + Sync + fmt::Debug {
    /// Runs `args[0]` with the remaining elements as arguments, optionally
    /// piping `stdin` to it, and waits for completion. Returns
    /// `FabricError::CommandFailure` on non-zero exit.
    fn run<'a>(&'a self, args: &'a [String], stdin: Option<&'a str>) -> BoxFuture<'a, Result<CommandOutput>>;
}

/// Spawns commands on the local host via `tokio::process::Command`, the
/// same piped-stdio-and-check-exit-status shape the nftables apply path
/// already used for shelling out to `nft`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalHostExecutor;

impl HostExecutor for LocalHostExecutor {
    fn run<'a>(&'a self, args: &'a [String], stdin: Option<&'a str>) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move {
            let Some((program, rest)) = args.split_first() else {
                return Err(FabricError::inconsistent("empty command"));
            };

            tracing::debug!(program, ?rest, "running host command");

            let mut cmd = Command::new(program);
            cmd.args(rest)
                .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());

            let mut child = cmd.spawn()?;

            if let Some(input) = stdin {
                if let Some(mut pipe) = child.stdin.take() {
                    pipe.write_all(input.as_bytes()).await?;
                }
            }

            let output = child.wait_with_output().await?;
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

            if !output.status.success() {
                return Err(FabricError::command_failure(
                    output.status.code().unwrap_or(-1),
                    args.to_vec(),
                    stdout,
                    stderr,
                ));
            }

            Ok(CommandOutput { stdout, stderr })
        })
    }
}

/// Broadcasts the same command to every configured remote executor in
/// addition to the local one. Per SPEC_FULL.md 4.A, a remote failure is
/// reported but does not undo the local side effect; only the local
/// executor's result is returned.
#[derive(Debug)]
pub struct DistributedExecutor {
    local: Box<dyn HostExecutor>,
    remotes: Vec<Box<dyn HostExecutor>>,
}

impl DistributedExecutor {
    pub fn new(local: Box<dyn HostExecutor>, remotes: Vec<Box<dyn HostExecutor>>) -> Self {
        Self { local, remotes }
    }
}

impl HostExecutor for DistributedExecutor {
    fn run<'a>(&'a self, args: &'a [String], stdin: Option<&'a str>) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move {
            for (i, remote) in self.remotes.iter().enumerate() {
                if let Err(err) = remote.run(args, stdin).await {
                    tracing::warn!(remote = i, %err, "remote host command failed, continuing");
                }
            }
            self.local.run(args, stdin).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_executor_runs_true_successfully() {
        let exec = LocalHostExecutor;
        let out = exec.run(&["true".to_string()], None).await.unwrap();
        assert_eq!(out.stdout, "");
    }

    #[tokio::test]
    async fn local_executor_reports_nonzero_exit() {
        let exec = LocalHostExecutor;
        let err = exec.run(&["false".to_string()], None).await.unwrap_err();
        assert!(err.is_command_failure());
    }

    #[tokio::test]
    async fn empty_args_is_inconsistent() {
        let exec = LocalHostExecutor;
        let err = exec.run(&[], None).await.unwrap_err();
        assert!(matches!(err, FabricError::Inconsistent(_)));
    }
}
