//! A `HostExecutor` fake that records invocations instead of spawning
//! processes. Used throughout the fabric crates' test suites so the filter
//! queue, net-client backends, and variants can be exercised without a
//! network namespace (SPEC_FULL.md §8 "test harness").

use std::sync::Mutex;

use cf_core::Result;
use futures::future::BoxFuture;

use crate::executor::{CommandOutput, HostExecutor};

#[derive(Debug, Default)]
pub struct RecordingExecutor {
    invocations: Mutex<Vec<Vec<String>>>,
    stdout: Mutex<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent `run` call returns this as its stdout. Used to
    /// script responses like `ip -o link show type bridge` output for
    /// `existing_bridges` checks.
    pub fn set_stdout(&self, stdout: impl Into<String>) {
        *self.stdout.lock().unwrap() = stdout.into();
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

impl HostExecutor for RecordingExecutor {
    fn run<'a>(&'a self, args: &'a [String], _stdin: Option<&'a str>) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move {
            self.invocations.lock().unwrap().push(args.to_vec());
            let stdout = self.stdout.lock().unwrap().clone();
            Ok(CommandOutput { stdout, stderr: String::new() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_every_invocation_in_order() {
        let exec = RecordingExecutor::new();
        exec.run(&["ip".into(), "link".into()], None).await.unwrap();
        exec.run(&["tc".into(), "qdisc".into()], None).await.unwrap();
        assert_eq!(exec.invocation_count(), 2);
        assert_eq!(exec.invocations()[0], vec!["ip", "link"]);
    }
}
