//! Per-check pacing task.
//!
//! While a check runs, exactly one transient thread samples elapsed time and
//! feeds fractional progress to the progress actor. It coordinates with the
//! executor only through its done-channel and the outgoing message queue.

use crate::ui::actor::ProgressHandle;
use crate::ui::model::CheckUpdate;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Sampling interval for fractional updates.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Highest fraction the pacer may report. The bar must not visually complete
/// before the real terminal result arrives.
const CEILING: f64 = 0.95;

pub(crate) struct Pacer {
    done: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

impl Pacer {
    /// Start pacing the check at `index`, scaling elapsed time against the
    /// expected duration learned from timing history.
    pub(crate) fn start(index: usize, progress: ProgressHandle, expected: Duration) -> Self {
        let (done, done_rx) = mpsc::channel::<()>();
        let thread = thread::spawn(move || {
            let started = Instant::now();
            loop {
                match done_rx.recv_timeout(SAMPLE_INTERVAL) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        let fraction = if expected.is_zero() {
                            CEILING
                        } else {
                            (started.elapsed().as_secs_f64() / expected.as_secs_f64())
                                .min(CEILING)
                        };
                        progress.update(CheckUpdate::running(index, fraction));
                    }
                }
            }
        });
        Self { done, thread }
    }

    /// Signal the pacer to stop and wait for it to exit.
    pub(crate) fn stop(self) {
        let _ = self.done.send(());
        let _ = self.thread.join();
    }
}
