//! Build, run, verify and tear down an application image
//!
//! [`ImageTest::run`] drives the whole scenario:
//!
//! 1. build the output image with the source-to-image tool (skipped in
//!    reuse mode),
//! 2. start it detached,
//! 3. check HTTP reachability and command output concurrently,
//! 4. remove the container.
//!
//! A failed build or start aborts the scenario. Once the container exists it
//! is removed exactly once, whatever the checks do.

use crate::builder::{ImageBuilder, ImageSource};
use crate::config::ImageTestConfig;
use crate::connectivity::{ConnectivityChecker, HttpProbe, ReqwestProbe};
use crate::error::{ImageTestError, Result};
use crate::parallel::CheckSet;
use crate::runtime::{ContainerId, ContainerRuntime};
use command_executor::{Launcher, LocalLauncher};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

/// Name of the HTTP reachability check
pub const CONNECTIVITY_CHECK: &str = "http-connectivity";
/// Name of the command output check
pub const OUTPUT_CHECK: &str = "command-output";

/// Image test scenario runner
#[derive(Clone)]
pub struct ImageTest {
    config: ImageTestConfig,
    launcher: Arc<dyn Launcher>,
    probe: Arc<dyn HttpProbe>,
}

impl std::fmt::Debug for ImageTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageTest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImageTest {
    /// Run real processes and real HTTP requests
    pub fn new(config: ImageTestConfig) -> Result<Self> {
        config.validate()?;
        let probe = ReqwestProbe::new(config.connectivity.request_timeout)?;
        Ok(Self::with_parts(config, LocalLauncher, probe))
    }

    /// Use the given launcher and HTTP probe
    pub fn with_parts<L, P>(config: ImageTestConfig, launcher: L, probe: P) -> Self
    where
        L: Launcher,
        P: HttpProbe,
    {
        Self {
            config,
            launcher: Arc::new(launcher),
            probe: Arc::new(probe),
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &ImageTestConfig {
        &self.config
    }

    /// Image builder for the configured build tool
    pub fn builder(&self) -> ImageBuilder {
        ImageBuilder::new(self.launcher.clone(), &self.config.build_tool)
    }

    /// Runtime wrapper for the configured container CLI
    pub fn runtime(&self) -> ContainerRuntime {
        ContainerRuntime::new(
            self.launcher.clone(),
            &self.config.runtime,
            self.config.user_id,
            self.config.app_port,
        )
    }

    /// Connectivity checker under the configured retry policy
    pub fn connectivity(&self) -> ConnectivityChecker {
        ConnectivityChecker::new(self.probe.clone(), self.config.connectivity)
    }

    /// Build (unless reusing), run, verify and remove `source.output_image`
    pub async fn run(&self, source: &ImageSource) -> Result<()> {
        self.config.validate()?;

        if self.config.reuse_images {
            info!("reusing existing image {}", source.output_image);
        } else {
            self.builder().build(source).await?;
        }

        let runtime = &self.runtime();
        let id = runtime.run_detached(&source.output_image).await?;

        with_container(runtime, id, |id| async move {
            let report = self
                .verification_checks(runtime, &source.output_image, &id)
                .run()
                .await;
            info!(
                "{}/{} checks passed for {}",
                report.passed(),
                report.total(),
                source.output_image
            );
            report.into_result()
        })
        .await
    }

    /// The checks run against a started container
    pub fn verification_checks(
        &self,
        runtime: &ContainerRuntime,
        image: &str,
        id: &ContainerId,
    ) -> CheckSet {
        let connectivity = {
            let runtime = runtime.clone();
            let id = id.clone();
            let checker = self.connectivity();
            async move {
                let ip = runtime.inspect_ip(&id).await?;
                checker.check(&runtime.app_url(&ip)).await.map(|_| ())
            }
        };
        let output = self
            .config
            .output_check
            .clone()
            .into_check(runtime.clone(), image.to_string(), id.clone());

        CheckSet::new()
            .with(CONNECTIVITY_CHECK, connectivity)
            .with(OUTPUT_CHECK, output)
    }
}

/// Run `body` against container `id`, then remove the container
///
/// Removal happens exactly once, after `body` completes, fails or panics.
/// A panic is resumed after removal. A removal failure is returned only when
/// `body` itself succeeded; otherwise it is logged and the body's error wins.
pub async fn with_container<F, Fut, T>(runtime: &ContainerRuntime, id: ContainerId, body: F) -> Result<T>
where
    F: FnOnce(ContainerId) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let outcome = AssertUnwindSafe(body(id.clone())).catch_unwind().await;
    let teardown = runtime.remove(&id).await;

    match (outcome, teardown) {
        (Err(panic), teardown) => {
            if let Err(e) = teardown {
                warn!("failed to remove container {}: {}", id, e);
            }
            std::panic::resume_unwind(panic)
        }
        (Ok(Ok(value)), Ok(())) => Ok(value),
        (Ok(Ok(_)), Err(source)) => Err(ImageTestError::Teardown {
            container: id.to_string(),
            source,
        }),
        (Ok(Err(e)), teardown) => {
            if let Err(t) = teardown {
                warn!("failed to remove container {}: {}", id, t);
            }
            Err(e)
        }
    }
}

/// Run the full scenario for `source` with real tools
pub async fn test_image_from_source(config: ImageTestConfig, source: &ImageSource) -> Result<()> {
    ImageTest::new(config)?.run(source).await
}

/// Like [`test_image_from_source`], for direct use in `#[test]` bodies
///
/// # Panics
///
/// Panics with the full error text when the scenario fails.
pub async fn assert_image_from_source(config: ImageTestConfig, source: &ImageSource) {
    if let Err(e) = test_image_from_source(config, source).await {
        panic!("image test for {} failed: {}", source.output_image, e);
    }
}
