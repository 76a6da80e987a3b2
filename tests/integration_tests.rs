//! End-to-end tests wiring the runner, printer, history, and progress actor
//! together the way an application embedding the crate would.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use vet::ui::SummaryLine;
use vet::{Printer, ProgressActor, Recorder, Report, RunContext, Runner, Theme, TimingHistory};

/// A cloneable in-memory sink for capturing printer output.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn scenario_runner(printer: Arc<dyn Report>, ran_c: Arc<AtomicBool>) -> Runner {
    let mut runner = Runner::new(printer);
    runner
        .category("Preflight")
        .add_fn("alpha", |_| Ok(()))
        .add_fn("beta", |_| anyhow::bail!("boom"))
        .with_remediation("fix beta")
        .add_fn("gamma", move |_| {
            ran_c.store(true, Ordering::SeqCst);
            Ok(())
        });
    runner
}

#[test]
fn full_run_reports_every_check() {
    let recorder = Arc::new(Recorder::new());
    let ran_c = Arc::new(AtomicBool::new(false));
    let runner = scenario_runner(recorder.clone(), ran_c.clone());

    let result = runner.run(&RunContext::new());
    assert_eq!(result.total, 3);
    assert_eq!(result.passed, 2);
    assert_eq!(result.failed, 1);
    assert!(!result.success());
    assert!(ran_c.load(Ordering::SeqCst));

    let summary = recorder
        .calls()
        .into_iter()
        .find(|c| c.method == "check_summary")
        .unwrap();
    assert_eq!(&summary.args[..2], ["false", "Preflight"]);
    assert_eq!(
        &summary.args[2..],
        ["alpha:pass", "beta:fail", "gamma:pass"]
    );
}

#[test]
fn fail_fast_skips_checks_after_the_first_failure() {
    let recorder = Arc::new(Recorder::new());
    let ran_c = Arc::new(AtomicBool::new(false));
    let mut runner = scenario_runner(recorder, ran_c.clone());
    runner.fail_fast(true);

    let result = runner.run(&RunContext::new());
    assert_eq!(result.total, 2);
    assert_eq!(result.passed, 1);
    assert_eq!(result.failed, 1);
    assert!(!ran_c.load(Ordering::SeqCst));
}

#[test]
fn piped_output_carries_no_ansi_even_with_a_decorated_theme() {
    let buf = SharedBuf::default();
    let printer = Arc::new(Printer::pipe(buf.clone(), Theme::decorated()));
    let runner = scenario_runner(printer, Arc::new(AtomicBool::new(false)));
    runner.run(&RunContext::new());

    let out = buf.contents();
    assert!(!out.contains('\x1b'));
    // Transient headers are suppressed without a terminal, so only final
    // outcome lines appear.
    assert!(out.contains("+ alpha"));
    assert!(out.contains("x beta"));
    assert!(out.contains("> fix beta"));
    assert!(out.contains("Preflight: 1 of 3 checks failed"));
}

#[test]
fn concurrent_success_lines_are_never_interleaved() {
    let buf = SharedBuf::default();
    let printer = Arc::new(Printer::pipe(buf.clone(), Theme::decorated()));

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let printer = printer.clone();
            thread::spawn(move || printer.check_success(&format!("worker-{i}")))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let out = buf.contents();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 100);
    for line in lines {
        assert!(line.starts_with("  + worker-"), "mangled line: {line:?}");
    }
}

#[test]
fn progress_wiring_records_timings_and_shuts_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(TimingHistory::load_from(dir.path().join("timings.json")));
    let recorder = Arc::new(Recorder::new());

    let mut runner = Runner::new(recorder);
    runner
        .add_fn("alpha", |_| {
            thread::sleep(Duration::from_millis(20));
            Ok(())
        })
        .add_fn("beta", |_| anyhow::bail!("boom"));

    let actor = ProgressActor::spawn("Checks", runner.check_names(), true);
    runner.with_progress(actor.handle(), history.clone());

    let ctx = RunContext::with_token(actor.cancel_token());
    let result = runner.run(&ctx);
    actor.handle().sync();
    actor.handle().done();
    actor.join();

    assert_eq!(result.total, 2);
    assert_eq!(history.record("alpha").unwrap().run_count, 1);
    assert_eq!(history.record("beta").unwrap().run_count, 1);
    assert!(history.record("alpha").unwrap().last_duration >= Duration::from_millis(20));
}

#[test]
fn quitting_the_actor_cancels_the_shared_run_context() {
    let recorder = Arc::new(Recorder::new());
    let mut runner = Runner::new(recorder);

    let actor = ProgressActor::spawn("Checks", vec!["first".into(), "second".into()], true);
    let handle = actor.handle();
    runner
        .add_fn("first", move |_| {
            handle.quit();
            Ok(())
        })
        .add_fn("second", |_| Ok(()));

    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(TimingHistory::load_from(dir.path().join("timings.json")));
    runner.with_progress(actor.handle(), history);

    let ctx = RunContext::with_token(actor.cancel_token());
    let result = runner.run(&ctx);
    actor.join();

    // The quit lands during "first"; "second" never starts.
    assert_eq!(result.total, 1);
    assert_eq!(result.checks[0].name, "first");
}

#[test]
fn finished_run_persists_the_timing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timings.json");
    let history = Arc::new(TimingHistory::load_from(&path));

    let mut runner = Runner::new(Arc::new(Recorder::new()));
    runner.add_fn("alpha", |_| Ok(()));

    let actor = ProgressActor::spawn("Checks", runner.check_names(), true);
    runner.with_progress(actor.handle(), history);
    runner.run(&RunContext::new());
    actor.handle().done();
    actor.join();

    // No explicit save(): finishing the run is enough.
    assert!(path.exists());
    let reloaded = TimingHistory::load_from(&path);
    assert_eq!(reloaded.record("alpha").unwrap().run_count, 1);
}

#[test]
fn history_persists_across_processes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timings.json");

    {
        let history = Arc::new(TimingHistory::load_from(&path));
        let recorder = Arc::new(Recorder::new());
        let mut runner = Runner::new(recorder);
        runner.add_fn("alpha", |_| Ok(()));

        let actor = ProgressActor::spawn("Checks", runner.check_names(), true);
        runner.with_progress(actor.handle(), history.clone());
        runner.run(&RunContext::new());
        actor.handle().done();
        actor.join();
        history.save();
    }

    let reloaded = TimingHistory::load_from(&path);
    assert_eq!(reloaded.record("alpha").unwrap().run_count, 1);
}

#[test]
fn summary_line_counts_match_the_run_result() {
    let recorder = Arc::new(Recorder::new());
    let runner = scenario_runner(recorder.clone(), Arc::new(AtomicBool::new(false)));
    let result = runner.run(&RunContext::new());

    let summary = recorder
        .calls()
        .into_iter()
        .find(|c| c.method == "check_summary")
        .unwrap();
    // Two leading args (status, title), then one entry per executed check.
    assert_eq!(summary.args.len() - 2, result.total);

    // The same data drives a console summary without panicking.
    let buf = SharedBuf::default();
    let printer = Printer::pipe(buf.clone(), Theme::decorated());
    let lines: Vec<SummaryLine> = result
        .checks
        .iter()
        .map(|c| SummaryLine {
            name: c.name.clone(),
            passed: c.passed,
            duration: c.duration,
        })
        .collect();
    printer.check_summary(result.success(), "Preflight", &lines);
    assert!(buf.contents().contains("Preflight"));
}
