//! Main executor type that wraps different launchers

use crate::command::Command;
use crate::error::{Error, Result};
use crate::launcher::Launcher;
use tracing::{debug, warn};

/// An executor that can run commands via a specific launcher
#[derive(Debug, Clone)]
pub struct Executor<L: Launcher> {
    /// The service name for logging/identification
    service_name: String,
    /// The launcher implementation
    launcher: L,
}

impl<L: Launcher> Executor<L> {
    /// Create a new executor with the given launcher
    pub fn new(service_name: impl Into<String>, launcher: L) -> Self {
        Self {
            service_name: service_name.into(),
            launcher,
        }
    }

    /// Run a command and return its combined output
    ///
    /// A non-zero exit becomes [`Error::ExitFailure`] with the captured
    /// bytes attached. Nothing is retried.
    pub async fn combined_output(&self, command: &Command) -> Result<Vec<u8>> {
        debug!(service = %self.service_name, "running: {}", command);

        let captured = self.launcher.output(command).await.inspect_err(|e| {
            warn!(service = %self.service_name, "failed to launch {}: {}", command, e);
        })?;

        if captured.status.success() {
            return Ok(captured.output);
        }

        warn!(
            service = %self.service_name,
            "{} finished with {}",
            command,
            captured.status
        );
        Err(Error::ExitFailure {
            program: command.get_program().to_string_lossy().into_owned(),
            status: captured.status,
            output: captured.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CapturedOutput;
    use crate::testing::ScriptedLauncher;

    #[test]
    fn test_success_returns_output() {
        futures::executor::block_on(async {
            let launcher = ScriptedLauncher::new();
            launcher.respond(["docker", "inspect"], CapturedOutput::success("172.17.0.2\n"));
            let executor = Executor::new("test", launcher);

            let cmd = Command::builder("docker").args(["inspect", "abc"]).build();
            let out = executor.combined_output(&cmd).await.unwrap();
            assert_eq!(out, b"172.17.0.2\n");
        });
    }

    #[test]
    fn test_non_zero_exit_keeps_output() {
        futures::executor::block_on(async {
            let launcher = ScriptedLauncher::new();
            launcher.respond(["docker", "rm"], CapturedOutput::failure(1, "No such container: abc"));
            let executor = Executor::new("test", launcher);

            let cmd = Command::builder("docker").args(["rm", "-f", "abc"]).build();
            let err = executor.combined_output(&cmd).await.unwrap_err();
            assert_eq!(err.output(), Some(&b"No such container: abc"[..]));
            assert!(err.to_string().contains("No such container: abc"));
            assert!(err.to_string().starts_with("docker exit status: 1"));
        });
    }
}
