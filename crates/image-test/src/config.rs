//! Configuration for image tests
//!
//! Every scenario receives its own [`ImageTestConfig`]; nothing here is
//! process-global. Configuration can be built in code, read from YAML, and
//! overridden from `IMAGETEST_*` environment variables.

use crate::checks::OutputCheck;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable toggling reuse mode
pub const REUSE_IMAGES_ENV: &str = "IMAGETEST_REUSE_IMAGES";
/// Environment variable overriding the build tool
pub const BUILD_TOOL_ENV: &str = "IMAGETEST_BUILD_TOOL";
/// Environment variable overriding the container runtime CLI
pub const RUNTIME_ENV: &str = "IMAGETEST_RUNTIME";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment variable holds an unusable value
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Bounded retry policy for the HTTP connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Pause after a transport error, in seconds when serialized
    #[serde(with = "secs")]
    pub retry_delay: Duration,
    /// Per-attempt request timeout, in seconds when serialized
    #[serde(with = "secs")]
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Settings for one image test scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageTestConfig {
    /// Skip the build and use an existing output image
    pub reuse_images: bool,
    /// Source-to-image build tool executable
    pub build_tool: String,
    /// Container runtime executable
    pub runtime: String,
    /// Numeric user the application container runs as
    pub user_id: u32,
    /// Port the application listens on inside the container
    pub app_port: u16,
    /// Connectivity check retry policy
    pub connectivity: RetryPolicy,
    /// Command whose output proves the image is set up correctly
    pub output_check: OutputCheck,
}

impl Default for ImageTestConfig {
    fn default() -> Self {
        Self {
            reuse_images: false,
            build_tool: "sti".to_string(),
            runtime: "docker".to_string(),
            user_id: 12345,
            app_port: 8080,
            connectivity: RetryPolicy::default(),
            output_check: OutputCheck::default(),
        }
    }
}

impl ImageTestConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Toggle reuse mode
    pub fn with_reuse_images(mut self, reuse: bool) -> Self {
        self.reuse_images = reuse;
        self
    }

    /// Replace the output check
    pub fn with_output_check(mut self, check: OutputCheck) -> Self {
        self.output_check = check;
        self
    }

    /// Replace the connectivity retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.connectivity = policy;
        self
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(REUSE_IMAGES_ENV) {
            self.reuse_images = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                var: REUSE_IMAGES_ENV,
                value,
            })?;
        }
        if let Some(tool) = lookup(BUILD_TOOL_ENV) {
            self.build_tool = tool;
        }
        if let Some(runtime) = lookup(RUNTIME_ENV) {
            self.runtime = runtime;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings no scenario can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build_tool.trim().is_empty() {
            return Err(ConfigError::Validation("build_tool is empty".to_string()));
        }
        if self.runtime.trim().is_empty() {
            return Err(ConfigError::Validation("runtime is empty".to_string()));
        }
        if self.app_port == 0 {
            return Err(ConfigError::Validation("app_port must not be 0".to_string()));
        }
        if self.connectivity.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "connectivity.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
