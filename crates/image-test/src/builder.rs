//! Source-to-image builds

use crate::error::{ImageTestError, Result};
use command_executor::{Command, Executor, Launcher};
use std::sync::Arc;
use tracing::info;

/// What to build and what to call the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// Base image supplying the build toolchain
    pub builder_image: String,
    /// Application source location, usually a git URL
    pub source: String,
    /// Directory within the source tree to build from; empty for the root
    pub context_dir: String,
    /// Name of the image to produce (or reuse)
    pub output_image: String,
}

impl ImageSource {
    /// Describe an application build
    pub fn new(
        builder_image: impl Into<String>,
        source: impl Into<String>,
        context_dir: impl Into<String>,
        output_image: impl Into<String>,
    ) -> Self {
        Self {
            builder_image: builder_image.into(),
            source: source.into(),
            context_dir: context_dir.into(),
            output_image: output_image.into(),
        }
    }
}

/// Runs the external build tool
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    executor: Executor<Arc<dyn Launcher>>,
    tool: String,
}

impl ImageBuilder {
    /// Create a builder invoking `tool`
    pub fn new(launcher: Arc<dyn Launcher>, tool: impl Into<String>) -> Self {
        let tool = tool.into();
        Self {
            executor: Executor::new(tool.clone(), launcher),
            tool,
        }
    }

    /// The command line a build of `source` runs
    pub fn command(&self, source: &ImageSource) -> Command {
        Command::builder(&self.tool)
            .arg("build")
            .arg("--force-pull=false")
            .arg(format!("--context-dir={}", source.context_dir))
            .arg(&source.source)
            .arg(&source.builder_image)
            .arg(&source.output_image)
            .build()
    }

    /// Build `source.output_image`, returning the tool's output
    ///
    /// On failure the build output is available through the error.
    pub async fn build(&self, source: &ImageSource) -> Result<Vec<u8>> {
        info!(
            "building {} from {} with {}",
            source.output_image, source.source, source.builder_image
        );
        let output = self
            .executor
            .combined_output(&self.command(source))
            .await
            .map_err(|source_err| ImageTestError::Build {
                image: source.output_image.clone(),
                source: source_err,
            })?;
        info!("built image {}", source.output_image);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_executor::CapturedOutput;
    use command_executor::testing::ScriptedLauncher;

    #[tokio::test]
    async fn test_build_arguments() {
        let launcher = ScriptedLauncher::new();
        launcher.respond(["sti", "build"], CapturedOutput::success("---> Installing application source\n"));
        let builder = ImageBuilder::new(Arc::new(launcher.clone()), "sti");

        let source = ImageSource::new("ruby-22-centos7", "https://example/app", "", "app-test");
        let output = builder.build(&source).await.unwrap();

        assert_eq!(output, b"---> Installing application source\n");
        assert_eq!(
            launcher.argv_log(),
            vec![vec![
                "sti",
                "build",
                "--force-pull=false",
                "--context-dir=",
                "https://example/app",
                "ruby-22-centos7",
                "app-test"
            ]]
        );
    }

    #[tokio::test]
    async fn test_build_failure_keeps_output() {
        let launcher = ScriptedLauncher::new();
        launcher.respond(
            ["sti", "build"],
            CapturedOutput::failure(1, "ERROR: Assemble script not found"),
        );
        let builder = ImageBuilder::new(Arc::new(launcher), "sti");

        let source = ImageSource::new("ruby-22-centos7", "https://example/app", "sub", "app-test");
        let err = builder.build(&source).await.unwrap_err();

        match &err {
            ImageTestError::Build { image, source } => {
                assert_eq!(image, "app-test");
                assert_eq!(source.output(), Some(&b"ERROR: Assemble script not found"[..]));
            }
            other => panic!("expected build error, got {other:?}"),
        }
        assert!(err.to_string().contains("Assemble script not found"));
    }
}
