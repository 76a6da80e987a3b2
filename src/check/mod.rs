//! Check registration, run context, and run results.
//!
//! A [`Check`] is a named `(context) -> outcome` function plus optional
//! remediation and display metadata. The [`Runner`] executes registered
//! checks strictly in insertion order and aggregates a [`RunResult`].

mod pacer;
mod runner;

pub use runner::Runner;

use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome-producing function for a single check.
///
/// Success is `Ok(())`; failure is any error, whose rendered chain becomes
/// the reported error text. A check may also panic; the runner converts the
/// panic into a failure instead of letting it escape.
pub type CheckFn = Box<dyn Fn(&RunContext) -> anyhow::Result<()> + Send + Sync>;

/// A named unit of validation logic. Immutable once registered.
pub struct Check {
    pub(crate) name: String,
    pub(crate) func: CheckFn,
    pub(crate) remediation: Option<String>,
    pub(crate) details: Option<String>,
}

impl Check {
    /// Create a check from a name and its validation function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&RunContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
            remediation: None,
            details: None,
        }
    }

    /// Attach human-readable guidance shown when this check fails.
    pub fn with_remediation(mut self, text: impl Into<String>) -> Self {
        self.remediation = Some(text.into());
        self
    }

    /// Replace the raw error text with a fixed detail message on failure.
    pub fn with_details(mut self, text: impl Into<String>) -> Self {
        self.details = Some(text.into());
        self
    }

    /// The check's display name, doubling as its timing-history key.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("remediation", &self.remediation)
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

/// Cancellation context handed to every check.
///
/// The runner consults it before starting each check; checks that spawn
/// subprocesses should watch [`RunContext::token`] themselves. The runner
/// never force-kills a non-cooperative check.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    cancel: CancellationToken,
}

impl RunContext {
    /// A fresh, uncancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context around an existing token (e.g. the progress actor's
    /// quit token).
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Request a clean early stop of the run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the underlying token, for checks that manage their own
    /// cancellable work.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Outcome of one executed check. Created exactly once, never mutated.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check that produced this result.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Error text for a failed check (`panic: <payload>` for panics).
    pub error: Option<String>,
    /// How long the check ran.
    pub duration: Duration,
}

/// Aggregate outcome of a run.
///
/// Invariant: `total == passed + failed == checks.len()`. `total` may be
/// smaller than the number of registered checks if fail-fast or cancellation
/// stopped the run early.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Per-check results in execution order.
    pub checks: Vec<CheckResult>,
    /// Number of passing checks.
    pub passed: usize,
    /// Number of failing checks.
    pub failed: usize,
    /// Number of checks that executed.
    pub total: usize,
    /// Wall-clock duration of the whole run.
    pub duration: Duration,
}

impl RunResult {
    /// True when no executed check failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}
