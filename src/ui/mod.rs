//! Terminal reporting: live progress rendering and line-based output.
//!
//! The actor ([`ProgressActor`]) owns a [`model::ProgressModel`] on a
//! dedicated thread and repaints it through the relative-cursor
//! [`engine::Frame`]. Line-based output goes through the [`Report`]
//! capability, implemented by [`Printer`] for consoles and [`Recorder`]
//! for tests.

pub mod actor;
pub mod engine;
pub mod model;
pub mod printer;
pub mod progress;
pub mod theme;

pub use actor::{ProgressActor, ProgressHandle};
pub use model::{CheckState, CheckUpdate, ProgressMsg};
pub use printer::{Printer, RecordedCall, Recorder, Report, SummaryLine};
pub use theme::Theme;
