//! Output assertion checks
//!
//! An [`OutputCheck`] runs a shell command through `bash -c` both inside the
//! running application container and in a fresh one-off container from the
//! same image, and requires the expected text in each output.

use crate::error::{ImageTestError, Result};
use crate::runtime::{ContainerId, ContainerRuntime};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Label for output captured through `exec`
pub const EXEC_CONTEXT: &str = "Docker exec output";
/// Label for output captured through `run --rm`
pub const RUN_CONTEXT: &str = "Docker run output";

/// Reusable check against an image and one of its running containers
pub type CheckFn = Arc<dyn Fn(&str, &ContainerId) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A shell command and the text its output must contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCheck {
    /// Command passed to `bash -c`
    pub command: String,
    /// Substring the command's combined output must contain
    pub expected: String,
}

impl Default for OutputCheck {
    fn default() -> Self {
        Self::scl_enabled("ruby --version", "ruby 2.0.0")
    }
}

impl OutputCheck {
    /// Check that `command` prints `expected`
    pub fn new(command: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            expected: expected.into(),
        }
    }

    /// Check that a software collection is enabled in the image
    ///
    /// The collection is considered enabled when `command` (typically an
    /// interpreter's `--version`) prints the collection's version string
    /// without any manual `scl enable` wrapping.
    pub fn scl_enabled(command: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(command, expected)
    }

    fn argv(&self) -> Vec<String> {
        vec!["bash".to_string(), "-c".to_string(), self.command.clone()]
    }

    /// Run the command in the running container `id`
    pub async fn exec_in(&self, runtime: &ContainerRuntime, id: &ContainerId) -> Result<()> {
        let output = runtime.exec(id, &self.argv()).await?;
        assert_output_contains(EXEC_CONTEXT, &output, &self.expected)
    }

    /// Run the command in a fresh container from `image`
    pub async fn run_fresh(&self, runtime: &ContainerRuntime, image: &str) -> Result<()> {
        let output = runtime.run_once(image, &self.argv()).await?;
        assert_output_contains(RUN_CONTEXT, &output, &self.expected)
    }

    /// Both variants, stopping at the first failure
    pub async fn verify(&self, runtime: &ContainerRuntime, image: &str, id: &ContainerId) -> Result<()> {
        self.exec_in(runtime, id).await?;
        self.run_fresh(runtime, image).await
    }

    /// Owned form of [`verify`](Self::verify), ready for a [`crate::CheckSet`]
    pub fn into_check(
        self,
        runtime: ContainerRuntime,
        image: String,
        id: ContainerId,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move { self.verify(&runtime, &image, &id).await })
    }

    /// Turn this check into a function callable for any image and container
    pub fn check_fn(self, runtime: ContainerRuntime) -> CheckFn {
        Arc::new(move |image: &str, id: &ContainerId| {
            self.clone()
                .into_check(runtime.clone(), image.to_string(), id.clone())
        })
    }
}

/// Fail unless `output` contains `expected`
pub fn assert_output_contains(context: &'static str, output: &[u8], expected: &str) -> Result<()> {
    if contains(output, expected.as_bytes()) {
        debug!("{} contains {:?}", context, expected);
        return Ok(());
    }
    Err(ImageTestError::OutputMismatch {
        context,
        got: String::from_utf8_lossy(output).into_owned(),
        want: expected.to_string(),
    })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
