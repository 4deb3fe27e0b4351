//! # Image Test
//!
//! Helpers for integration tests of application container images. A test
//! builds an image from source with a source-to-image tool, starts it with a
//! container runtime CLI, and verifies that the application answers HTTP
//! requests and that a shell command prints what it should.
//!
//! ```no_run
//! use image_test::{ImageSource, ImageTestConfig, OutputCheck};
//!
//! # async fn example() -> image_test::Result<()> {
//! let config = ImageTestConfig::from_env()?
//!     .with_output_check(OutputCheck::scl_enabled("ruby --version", "ruby 2.2"));
//! let source = ImageSource::new("ruby-22-centos7", "https://github.com/openshift/ruby-hello-world", "", "ruby-hello-world");
//! image_test::test_image_from_source(config, &source).await
//! # }
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod checks;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod logging;
pub mod parallel;
pub mod runtime;
pub mod scenario;

pub use builder::{ImageBuilder, ImageSource};
pub use checks::{CheckFn, OutputCheck};
pub use config::{ConfigError, ImageTestConfig, RetryPolicy};
pub use connectivity::{ConnectivityChecker, HttpProbe, ProbeError, ReqwestProbe};
pub use error::{ImageTestError, Result};
pub use parallel::{CheckFailure, CheckReport, CheckSet, Reporter, run_in_parallel};
pub use runtime::{ContainerId, ContainerRuntime};
pub use scenario::{ImageTest, assert_image_from_source, test_image_from_source, with_container};
