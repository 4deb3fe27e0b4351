//! Error types for image tests

use crate::config::ConfigError;
use crate::parallel::CheckFailure;
use thiserror::Error;

/// Everything that can make an image test fail
#[derive(Debug, Error)]
pub enum ImageTestError {
    /// An external command could not start or exited non-zero
    ///
    /// The wrapped error carries the command's combined output.
    #[error(transparent)]
    Command(#[from] command_executor::Error),

    /// The build tool failed to produce the output image
    #[error("building image {image} failed: {source}")]
    Build {
        /// The output image that was being built
        image: String,
        /// The underlying build tool failure
        source: command_executor::Error,
    },

    /// `run -d` succeeded but printed no container id
    #[error("container runtime printed no container id for image {image}")]
    EmptyContainerId {
        /// The image that was started
        image: String,
    },

    /// The container has no address on the runtime's default network
    #[error("container {container} has no IP address")]
    EmptyAddress {
        /// The inspected container
        container: String,
    },

    /// A command's output did not contain the expected text
    #[error("{context}: got '{got}', want '{want}'")]
    OutputMismatch {
        /// Which kind of invocation produced the output
        context: &'static str,
        /// Captured output, lossily decoded
        got: String,
        /// Expected substring
        want: String,
    },

    /// The application answered with an unexpected HTTP status
    #[error("HTTP status: got {got}, want {want}")]
    HttpStatus {
        /// Observed status code
        got: u16,
        /// Required status code
        want: u16,
    },

    /// The connectivity check never got a response
    #[error("failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last_error: String,
    },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// One or more verification checks failed
    #[error("{} check(s) failed: {}", .0.len(), describe_failures(.0))]
    ChecksFailed(Vec<CheckFailure>),

    /// Removing the test container failed
    #[error("removing container {container} failed: {source}")]
    Teardown {
        /// The container that could not be removed
        container: String,
        /// The underlying runtime failure
        source: command_executor::Error,
    },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ImageTestError {
    /// Individual check failures, when this error aggregates them
    pub fn check_failures(&self) -> &[CheckFailure] {
        match self {
            ImageTestError::ChecksFailed(failures) => failures,
            _ => &[],
        }
    }
}

fn describe_failures(failures: &[CheckFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for image test operations
pub type Result<T> = std::result::Result<T, ImageTestError>;
