//! Launcher trait for executing commands in different contexts

use crate::command::Command;
use crate::error::Result;
use crate::process::CapturedOutput;
use async_trait::async_trait;

/// A launcher that runs a command to completion and captures its output
///
/// Launchers only report how the process ended; deciding whether a non-zero
/// exit is an error is left to [`crate::Executor`].
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// Run `command`, returning its exit status and combined stdout/stderr
    async fn output(&self, command: &Command) -> Result<CapturedOutput>;
}

#[async_trait]
impl<L: Launcher + ?Sized> Launcher for std::sync::Arc<L> {
    async fn output(&self, command: &Command) -> Result<CapturedOutput> {
        (**self).output(command).await
    }
}

impl std::fmt::Debug for dyn Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Launcher")
    }
}
