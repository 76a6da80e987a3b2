//! Sequential, panic-safe check executor.
//!
//! The runner owns no rendering state: it emits events to a [`Report`]
//! implementation and, when wired, messages to the progress actor. Checks
//! never run concurrently with each other, so their side effects cannot
//! interleave and output ordering is deterministic.

use super::pacer::Pacer;
use super::{Check, CheckResult, RunContext, RunResult};
use crate::history::TimingHistory;
use crate::ui::actor::ProgressHandle;
use crate::ui::model::CheckUpdate;
use crate::ui::printer::{Report, SummaryLine};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Sequential executor of a named list of checks.
pub struct Runner {
    checks: Vec<Check>,
    fail_fast: bool,
    title: String,
    printer: Arc<dyn Report>,
    progress: Option<(ProgressHandle, Arc<TimingHistory>)>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("checks", &self.checks)
            .field("fail_fast", &self.fail_fast)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Create a runner that reports through `printer`.
    pub fn new(printer: Arc<dyn Report>) -> Self {
        Self {
            checks: Vec::new(),
            fail_fast: false,
            title: "Checks".to_string(),
            printer,
            progress: None,
        }
    }

    /// Title used for the summary event (defaults to "Checks").
    pub fn category(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Halt remaining checks after the first failure.
    pub fn fail_fast(&mut self, enabled: bool) -> &mut Self {
        self.fail_fast = enabled;
        self
    }

    /// Wire a progress actor and the timing history that paces its bars.
    /// The history is persisted (best-effort) when the run completes.
    pub fn with_progress(
        &mut self,
        handle: ProgressHandle,
        history: Arc<TimingHistory>,
    ) -> &mut Self {
        self.progress = Some((handle, history));
        self
    }

    /// Append a check.
    pub fn add(&mut self, check: Check) -> &mut Self {
        self.checks.push(check);
        self
    }

    /// Append a check built from a name and function.
    pub fn add_fn<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&RunContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(Check::new(name, func))
    }

    /// Attach remediation guidance to the most recently added check.
    /// No-op when nothing has been added yet.
    pub fn with_remediation(&mut self, text: impl Into<String>) -> &mut Self {
        if let Some(check) = self.checks.last_mut() {
            check.remediation = Some(text.into());
        }
        self
    }

    /// Attach a fixed failure detail message to the most recently added
    /// check. No-op when nothing has been added yet.
    pub fn with_details(&mut self, text: impl Into<String>) -> &mut Self {
        if let Some(check) = self.checks.last_mut() {
            check.details = Some(text.into());
        }
        self
    }

    /// Names of the registered checks, in insertion order. Useful for
    /// seeding a progress actor before running.
    pub fn check_names(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.name.clone()).collect()
    }

    /// Execute the registered checks in insertion order.
    ///
    /// Never returns an error itself: failure is only observable through
    /// [`RunResult::failed`] and [`RunResult::success`].
    pub fn run(&self, ctx: &RunContext) -> RunResult {
        let started = Instant::now();
        let mut results: Vec<CheckResult> = Vec::new();

        for (index, check) in self.checks.iter().enumerate() {
            if ctx.is_cancelled() {
                debug!(check = %check.name, "run cancelled, skipping remaining checks");
                break;
            }

            debug!(check = %check.name, "check starting");
            self.printer.check_header(&check.name);

            let pacer = self.progress.as_ref().map(|(handle, history)| {
                handle.update(CheckUpdate::running(index, 0.0));
                Pacer::start(index, handle.clone(), history.expected_duration(&check.name))
            });

            let check_started = Instant::now();
            let outcome = catch_unwind(AssertUnwindSafe(|| (check.func)(ctx)));
            let duration = check_started.elapsed();

            if let Some(pacer) = pacer {
                pacer.stop();
            }

            let error = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(format!("{err:#}")),
                Err(payload) => Some(format!("panic: {}", panic_text(payload.as_ref()))),
            };
            let passed = error.is_none();

            if passed {
                debug!(check = %check.name, ?duration, "check passed");
                self.printer.check_success(&check.name);
            } else {
                let raw = error.clone().unwrap_or_default();
                let details = check.details.as_deref().unwrap_or(&raw);
                debug!(check = %check.name, ?duration, error = %raw, "check failed");
                self.printer
                    .check_failure(&check.name, details, check.remediation.as_deref());
            }

            if let Some((handle, history)) = &self.progress {
                history.record_duration(&check.name, duration);
                handle.update(CheckUpdate::finished(
                    index,
                    passed,
                    duration,
                    error.clone(),
                    check.remediation.clone(),
                ));
            }

            results.push(CheckResult {
                name: check.name.clone(),
                passed,
                error,
                duration,
            });

            if self.fail_fast && !passed {
                debug!(check = %check.name, "fail-fast enabled, stopping run");
                break;
            }
        }

        if let Some((_, history)) = &self.progress {
            history.save();
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        let lines: Vec<SummaryLine> = results
            .iter()
            .map(|r| SummaryLine {
                name: r.name.clone(),
                passed: r.passed,
                duration: r.duration,
            })
            .collect();
        self.printer.check_summary(failed == 0, &self.title, &lines);

        let total = results.len();
        RunResult {
            checks: results,
            passed,
            failed,
            total,
            duration: started.elapsed(),
        }
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "opaque panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::printer::Recorder;
    use anyhow::bail;

    fn recorder_runner() -> (Arc<Recorder>, Runner) {
        let recorder = Arc::new(Recorder::new());
        let runner = Runner::new(recorder.clone());
        (recorder, runner)
    }

    #[test]
    fn all_checks_appear_exactly_once() {
        let (_, mut runner) = recorder_runner();
        runner
            .add_fn("one", |_| Ok(()))
            .add_fn("two", |_| bail!("nope"))
            .add_fn("three", |_| Ok(()));
        let result = runner.run(&RunContext::new());
        assert_eq!(result.total, 3);
        assert_eq!(result.passed + result.failed, result.total);
        let names: Vec<&str> = result.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["one", "two", "three"]);
    }

    #[test]
    fn panic_is_converted_into_a_failure() {
        let (_, mut runner) = recorder_runner();
        runner.add_fn("boomer", |_| panic!("kaboom"));
        let result = runner.run(&RunContext::new());
        assert_eq!(result.failed, 1);
        let error = result.checks[0].error.as_deref().unwrap();
        assert!(error.contains("panic:"), "got {error:?}");
        assert!(error.contains("kaboom"), "got {error:?}");
    }

    #[test]
    fn string_panic_payload_is_preserved() {
        let (_, mut runner) = recorder_runner();
        runner.add_fn("fmt", |_| panic!("{}", String::from("owned payload")));
        let result = runner.run(&RunContext::new());
        assert_eq!(
            result.checks[0].error.as_deref(),
            Some("panic: owned payload")
        );
    }

    #[test]
    fn details_override_raw_error_in_failure_event() {
        let (recorder, mut runner) = recorder_runner();
        runner
            .add_fn("deps", |_| bail!("exit status 1"))
            .with_details("dependency graph has drifted")
            .with_remediation("run the update script");
        runner.run(&RunContext::new());

        let failure = recorder
            .calls()
            .into_iter()
            .find(|c| c.method == "check_failure")
            .unwrap();
        assert_eq!(
            failure.args,
            vec![
                "deps".to_string(),
                "dependency graph has drifted".to_string(),
                "run the update script".to_string(),
            ]
        );
    }

    #[test]
    fn metadata_builders_are_noops_on_an_empty_runner() {
        let (_, mut runner) = recorder_runner();
        runner.with_remediation("nothing to attach to");
        runner.with_details("still nothing");
        let result = runner.run(&RunContext::new());
        assert_eq!(result.total, 0);
        assert!(result.success());
    }

    #[test]
    fn cancelled_context_stops_before_the_next_check() {
        let (_, mut runner) = recorder_runner();
        runner
            .add_fn("first", |ctx| {
                ctx.cancel();
                Ok(())
            })
            .add_fn("second", |_| Ok(()));
        let result = runner.run(&RunContext::new());
        assert_eq!(result.total, 1);
        assert_eq!(result.checks[0].name, "first");
        assert!(result.checks[0].passed);
    }

    #[test]
    fn pre_cancelled_context_runs_nothing() {
        let (recorder, mut runner) = recorder_runner();
        runner.add_fn("never", |_| Ok(()));
        let ctx = RunContext::new();
        ctx.cancel();
        let result = runner.run(&ctx);
        assert_eq!(result.total, 0);
        // Only the summary event fires.
        assert_eq!(recorder.names(), vec!["check_summary"]);
    }

    #[test]
    fn event_order_matches_execution() {
        let (recorder, mut runner) = recorder_runner();
        runner
            .add_fn("good", |_| Ok(()))
            .add_fn("bad", |_| bail!("broken"));
        runner.run(&RunContext::new());
        assert_eq!(
            recorder.names(),
            vec![
                "check_header",
                "check_success",
                "check_header",
                "check_failure",
                "check_summary",
            ]
        );
    }
}
