//! vet - check orchestration with live terminal progress
//!
//! Runs an ordered collection of independent validation tasks ("checks"),
//! tracks each one's pass/fail outcome, and renders real-time progress to a
//! terminal, pacing animated bars with learned historical timings.
//!
//! # Architecture
//!
//! - **Actor pattern**: all live rendering state is owned by a single
//!   consumer loop ([`ui::ProgressActor`]); every external input is a message.
//! - **Dependency injection**: callers render through the [`ui::Report`]
//!   capability trait, with a console implementation ([`ui::Printer`]) and a
//!   call-recorder ([`ui::Recorder`]) for assertions.
//! - **Panic safety**: a panicking check becomes a failed result, never a
//!   crashed run.
//!
//! # Flow
//!
//! ```text
//! Runner ──(events)──> Report            (always)
//!   │  └──(messages)─> ProgressActor     (when wired)
//!   └────(durations)─> TimingHistory ──> pacer expectations
//! ```

pub mod check;
pub mod history;
pub mod ui;

pub use check::{Check, CheckResult, RunContext, RunResult, Runner};
pub use history::{TimingHistory, TimingRecord};
pub use ui::{
    CheckState, CheckUpdate, Printer, ProgressActor, ProgressHandle, Recorder, Report, Theme,
};
