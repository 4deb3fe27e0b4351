//! Container runtime CLI wrapper
//!
//! Drives `docker` (or a CLI with the same surface) to start, inspect, exec
//! into and remove the application container.

use crate::error::{ImageTestError, Result};
use command_executor::{Command, Executor, Launcher};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Format query returning a container's address on the default bridge network
pub const IP_ADDRESS_FORMAT: &str = "--format='{{ .NetworkSettings.IPAddress }}'";

/// Identifier printed by `run -d`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Container runtime commands used by image tests
#[derive(Debug, Clone)]
pub struct ContainerRuntime {
    executor: Executor<Arc<dyn Launcher>>,
    binary: String,
    user_id: u32,
    app_port: u16,
}

impl ContainerRuntime {
    /// Create a runtime wrapper around `binary`
    pub fn new(launcher: Arc<dyn Launcher>, binary: impl Into<String>, user_id: u32, app_port: u16) -> Self {
        let binary = binary.into();
        Self {
            executor: Executor::new(binary.clone(), launcher),
            binary,
            user_id,
            app_port,
        }
    }

    /// Runtime executable
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Port the application listens on inside the container
    pub fn app_port(&self) -> u16 {
        self.app_port
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::builder(&self.binary).args(args).build()
    }

    /// Start `image` detached as the configured user, publishing the app port
    pub async fn run_detached(&self, image: &str) -> Result<ContainerId> {
        let cmd = self.command([
            "run".to_string(),
            format!("--user={}", self.user_id),
            "-p".to_string(),
            self.app_port.to_string(),
            "-d".to_string(),
            image.to_string(),
        ]);
        let output = self.executor.combined_output(&cmd).await?;

        let id = String::from_utf8_lossy(&output).trim().to_string();
        if id.is_empty() {
            return Err(ImageTestError::EmptyContainerId {
                image: image.to_string(),
            });
        }
        info!("started container {} from image {}", id, image);
        Ok(ContainerId(id))
    }

    /// Force-remove a container
    pub async fn remove(&self, id: &ContainerId) -> std::result::Result<(), command_executor::Error> {
        let cmd = self.command(["rm", "-f", id.as_str()]);
        self.executor.combined_output(&cmd).await?;
        info!("removed container {}", id);
        Ok(())
    }

    /// Address of the container on the runtime's default network
    pub async fn inspect_ip(&self, id: &ContainerId) -> Result<String> {
        let cmd = self.command(["inspect", IP_ADDRESS_FORMAT, id.as_str()]);
        let output = self.executor.combined_output(&cmd).await?;

        // The quoted format string makes the runtime echo the quotes back.
        let ip = String::from_utf8_lossy(&output)
            .trim()
            .trim_matches('\'')
            .trim()
            .to_string();
        if ip.is_empty() {
            return Err(ImageTestError::EmptyAddress {
                container: id.to_string(),
            });
        }
        debug!("container {} has address {}", id, ip);
        Ok(ip)
    }

    /// URL of the application served from `ip`
    pub fn app_url(&self, ip: &str) -> String {
        format!("http://{}:{}", ip, self.app_port)
    }

    /// Run `argv` inside a running container and return its output
    pub async fn exec(&self, id: &ContainerId, argv: &[String]) -> Result<Vec<u8>> {
        let mut cmd = self.command(["exec", id.as_str()]);
        cmd.args(argv);
        Ok(self.executor.combined_output(&cmd).await?)
    }

    /// Run `argv` in a fresh, auto-removed container from `image`
    pub async fn run_once(&self, image: &str, argv: &[String]) -> Result<Vec<u8>> {
        let mut cmd = self.command(["run", "--rm", image]);
        cmd.args(argv);
        Ok(self.executor.combined_output(&cmd).await?)
    }
}
