//! Concurrent execution of independent checks
//!
//! Every check in a [`CheckSet`] runs as its own Tokio task. A failing or
//! panicking check never stops its siblings, and every failure ends up in the
//! returned [`CheckReport`].

use crate::error::{ImageTestError, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Name the check was registered under
    pub check: String,
    /// Human-readable reason
    pub message: String,
}

impl CheckFailure {
    /// Record a failure of `check`
    pub fn new(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}

/// Failure sink shared by concurrently running checks
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    failures: Arc<Mutex<Vec<CheckFailure>>>,
}

impl Reporter {
    /// Record a failure
    pub fn record(&self, failure: CheckFailure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }

    /// Failures recorded so far
    pub fn failures(&self) -> Vec<CheckFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Outcome of running a [`CheckSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    total: usize,
    failures: Vec<CheckFailure>,
}

impl CheckReport {
    /// Number of checks that ran
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of checks that passed
    pub fn passed(&self) -> usize {
        self.total - self.failures.len()
    }

    /// Every failure, in completion order
    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    /// True when no check failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok` when every check passed, otherwise all failures as one error
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ImageTestError::ChecksFailed(self.failures))
        }
    }
}

/// A set of independent checks to run concurrently
#[derive(Default)]
pub struct CheckSet {
    checks: Vec<(String, BoxFuture<'static, Result<()>>)>,
}

impl fmt::Debug for CheckSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|(name, _)| name))
            .finish()
    }
}

impl CheckSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `name`
    pub fn add<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.checks.push((name.into(), Box::pin(check)));
        self
    }

    /// Builder form of [`add`](Self::add)
    pub fn with<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.add(name, check);
        self
    }

    /// Number of registered checks
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// True when no checks are registered
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check concurrently and wait for all of them
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn run(self) -> CheckReport {
        let reporter = Reporter::default();
        let total = self.checks.len();

        let mut tasks = Vec::with_capacity(total);
        for (name, check) in self.checks {
            let reporter = reporter.clone();
            let task_name = name.clone();
            let handle = tokio::spawn(async move {
                debug!("check {} started", task_name);
                match check.await {
                    Ok(()) => debug!("check {} passed", task_name),
                    Err(e) => {
                        warn!("check {} failed: {}", task_name, e);
                        reporter.record(CheckFailure::new(task_name, e.to_string()));
                    }
                }
            });
            tasks.push((name, handle));
        }

        for (name, handle) in tasks {
            if let Err(join_err) = handle.await {
                let message = if join_err.is_panic() {
                    format!("check panicked: {}", panic_message(join_err.into_panic()))
                } else {
                    "check was cancelled".to_string()
                };
                warn!("check {} aborted: {}", name, message);
                reporter.record(CheckFailure::new(name, message));
            }
        }

        CheckReport {
            total,
            failures: reporter.failures(),
        }
    }
}

/// Run `checks` concurrently, see [`CheckSet::run`]
pub async fn run_in_parallel<I, S>(checks: I) -> CheckReport
where
    I: IntoIterator<Item = (S, BoxFuture<'static, Result<()>>)>,
    S: Into<String>,
{
    let mut set = CheckSet::new();
    for (name, check) in checks {
        set.add(name, check);
    }
    set.run().await
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
