//! HTTP reachability check with bounded retries
//!
//! Transport errors (the application may still be starting) are retried
//! after a delay. Any HTTP status other than 200 fails at once.

use crate::config::RetryPolicy;
use crate::error::{ImageTestError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Status the application must answer with
pub const EXPECTED_STATUS: u16 = 200;

/// A request that produced no HTTP response
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Error from the HTTP client
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// Any other transport failure
    #[error("{0}")]
    Transport(String),
}

/// Issues HEAD requests
#[async_trait]
pub trait HttpProbe: Send + Sync + 'static {
    /// Send `HEAD url` and return the response status
    async fn head(&self, url: &str) -> std::result::Result<u16, ProbeError>;
}

/// [`HttpProbe`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    /// Create a probe whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn head(&self, url: &str) -> std::result::Result<u16, ProbeError> {
        let response = self.client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}

/// Polls a URL until it answers 200 or the attempt budget runs out
#[derive(Clone)]
pub struct ConnectivityChecker {
    probe: Arc<dyn HttpProbe>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ConnectivityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityChecker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ConnectivityChecker {
    /// Create a checker using `probe` under `policy`
    ///
    /// A policy of zero attempts is treated as one attempt.
    pub fn new(probe: Arc<dyn HttpProbe>, mut policy: RetryPolicy) -> Self {
        policy.max_attempts = policy.max_attempts.max(1);
        Self { probe, policy }
    }

    /// The retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Check `url`, returning how many attempts it took
    pub async fn check(&self, url: &str) -> Result<u32> {
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            debug!("HEAD {} (attempt {}/{})", url, attempt, self.policy.max_attempts);
            match self.probe.head(url).await {
                Ok(EXPECTED_STATUS) => {
                    info!("{} reachable after {} attempt(s)", url, attempt);
                    return Ok(attempt);
                }
                Ok(status) => {
                    return Err(ImageTestError::HttpStatus {
                        got: status,
                        want: EXPECTED_STATUS,
                    });
                }
                Err(e) => {
                    debug!("HEAD {} failed: {}", url, e);
                    last_error = Some(e);
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        Err(ImageTestError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
