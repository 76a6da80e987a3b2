//! Progress actor - single-threaded event processing.
//!
//! All live rendering is channeled through one consumer thread that owns the
//! [`ProgressModel`] exclusively. Workers never wait for render locks, the
//! display survives worker panics, and updates are applied in a guaranteed
//! order. Animation is driven by the receive timeout: when no message
//! arrives within a tick, running rows are repainted with the next spinner
//! frame.

use super::engine::Frame;
use super::model::{CheckState, CheckUpdate, Line, ProgressModel, ProgressMsg};
use super::theme::Theme;
use std::io::Write;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Animation tick driving spinner frames and running-bar repaints.
const TICK: Duration = Duration::from_millis(80);

/// Handle to the progress actor thread.
#[derive(Debug)]
pub struct ProgressActor {
    sender: mpsc::Sender<ProgressMsg>,
    cancel: CancellationToken,
    thread: thread::JoinHandle<()>,
}

impl ProgressActor {
    /// Spawn the actor for one category of checks with the default theme.
    pub fn spawn(title: impl Into<String>, names: Vec<String>, skip_summary: bool) -> Self {
        Self::spawn_with(title, names, skip_summary, Theme::decorated())
    }

    /// Spawn with an explicit theme.
    pub fn spawn_with(
        title: impl Into<String>,
        names: Vec<String>,
        skip_summary: bool,
        theme: Theme,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        let model = ProgressModel::new(title, names, skip_summary);
        let thread = thread::spawn(move || run_event_loop(&receiver, model, &theme));
        Self {
            sender,
            cancel: CancellationToken::new(),
            thread,
        }
    }

    /// A cloneable handle for sending messages to this actor.
    pub fn handle(&self) -> ProgressHandle {
        ProgressHandle {
            sender: self.sender.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Token cancelled when a quit is requested. Build the executor's
    /// [`crate::RunContext`] from it so quitting also stops in-flight
    /// checks that honor cancellation.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the render loop to exit (after `Done` or `Quit`).
    pub fn join(self) {
        drop(self.sender);
        let _ = self.thread.join();
    }
}

/// Cloneable sender for high-level progress events.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    sender: mpsc::Sender<ProgressMsg>,
    cancel: CancellationToken,
}

impl ProgressHandle {
    /// Reserve the render region and start periodic ticking.
    pub fn init(&self) {
        let _ = self.sender.send(ProgressMsg::Init);
    }

    /// Apply a per-check state transition.
    pub fn update(&self, update: CheckUpdate) {
        let _ = self.sender.send(ProgressMsg::Update(update));
    }

    /// Record a coverage percentage for the final summary.
    pub fn coverage(&self, percent: f64) {
        let _ = self.sender.send(ProgressMsg::Coverage(percent));
    }

    /// Signal that all checks finished.
    pub fn done(&self) {
        let _ = self.sender.send(ProgressMsg::Done);
    }

    /// Terminate the render loop now and cancel the associated run token,
    /// so cooperating in-flight checks stop too.
    pub fn quit(&self) {
        self.cancel.cancel();
        let _ = self.sender.send(ProgressMsg::Quit);
    }

    /// Block until every message sent before this call has been processed.
    pub fn sync(&self) {
        let (ack, done) = tokio::sync::oneshot::channel();
        if self.sender.send(ProgressMsg::Sync(ack)).is_ok() {
            let _ = done.blocking_recv();
        }
    }
}

fn run_event_loop(receiver: &mpsc::Receiver<ProgressMsg>, mut model: ProgressModel, theme: &Theme) {
    let mut frame: Option<Frame> = None;

    loop {
        match receiver.recv_timeout(TICK) {
            Ok(ProgressMsg::Init) => {
                model.start();
                let mut fresh = Frame::new(model.line_count());
                let _ = fresh.start();
                render_lines(&mut fresh, &model, theme, false);
                frame = Some(fresh);
            }
            Ok(ProgressMsg::Update(update)) => {
                let grew = model.apply(update);
                if let Some(frame) = frame.as_mut() {
                    if grew {
                        let _ = frame.grow(1);
                    }
                    render_lines(frame, &model, theme, false);
                }
            }
            Ok(ProgressMsg::Coverage(percent)) => model.set_coverage(percent),
            Ok(ProgressMsg::Done) => {
                model.finish();
                if let Some(mut frame) = frame.take() {
                    render_lines(&mut frame, &model, theme, false);
                    let _ = frame.finish();
                }
                if !model.skip_summary() {
                    for line in model.render_summary(theme) {
                        println!("{line}");
                    }
                }
                debug!("progress loop done");
                break;
            }
            Ok(ProgressMsg::Quit) => {
                if let Some(mut frame) = frame.take() {
                    let _ = frame.finish();
                }
                debug!("progress loop quit");
                break;
            }
            Ok(ProgressMsg::Sync(ack)) => {
                let _ = ack.send(());
            }
            Err(RecvTimeoutError::Timeout) => {
                model.tick();
                if let Some(frame) = frame.as_mut() {
                    render_lines(frame, &model, theme, true);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                if let Some(mut frame) = frame.take() {
                    let _ = frame.finish();
                }
                break;
            }
        }
    }
}

/// Repaint display lines; with `running_only`, touch just the animating rows.
fn render_lines(frame: &mut Frame, model: &ProgressModel, theme: &Theme, running_only: bool) {
    for (row, line) in model.lines().iter().enumerate() {
        if running_only {
            let Line::Check(index) = line else { continue };
            if model.checks()[*index].state != CheckState::Running {
                continue;
            }
        }
        let text = model.render_line(*line, theme);
        let _ = frame.write_row(row as u16, |out| write!(out, "{text}"));
    }
    let _ = frame.flush();
}
