//! Report contract and its two implementations.
//!
//! Callers that orchestrate checks depend only on the [`Report`] capability
//! trait. The console implementation ([`Printer`]) renders themed lines to
//! an arbitrary byte sink; the call-recorder ([`Recorder`]) logs every
//! invocation for assertion-based tests. Which one a caller gets is decided
//! by dependency injection at construction, never by runtime inspection.

use super::progress::format_duration;
use super::theme::Theme;
use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    terminal::{Clear, ClearType},
};
use std::fmt;
use std::io::{IsTerminal, Write};
use std::sync::Mutex;
use std::time::Duration;

/// One line of a run summary: a check's outcome and timing.
#[derive(Debug, Clone)]
pub struct SummaryLine {
    /// Check name.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// How long the check ran.
    pub duration: Duration,
}

/// Structured rendering of check events.
///
/// Implementations must be safe for concurrent invocation from multiple
/// call sites; each method renders one complete event.
pub trait Report: Send + Sync {
    /// A rule announcing a category of checks.
    fn category_header(&self, title: &str);
    /// A transient "check starting" line. No-op on non-interactive sinks.
    fn check_header(&self, message: &str);
    /// A check finished successfully.
    fn check_success(&self, message: &str);
    /// A check failed, with detail text and optional remediation guidance.
    fn check_failure(&self, title: &str, details: &str, remediation: Option<&str>);
    /// Final roll-up for a run: overall status plus one line per check.
    fn check_summary(&self, passed: bool, title: &str, lines: &[SummaryLine]);
    /// An indented informational block.
    fn check_info(&self, lines: &[String]);
    /// A dim side note.
    fn check_note(&self, message: &str);
    /// One check outcome line, for callers streaming their own roll-up.
    fn check_line(&self, name: &str, passed: bool, duration: Duration);
}

/// Thread-safe console renderer.
///
/// Interactivity is probed once at construction: a non-terminal sink
/// downgrades the theme to [`Theme::minimal`] (unless the theme forces
/// colors) and disables transient headers. The theme never changes after
/// construction.
pub struct Printer {
    inner: Mutex<Inner>,
}

struct Inner {
    sink: Box<dyn Write + Send>,
    theme: Theme,
    interactive: bool,
    transient: bool,
}

impl Printer {
    /// Probe `sink` for interactivity and build a printer around it.
    pub fn new<W>(sink: W, theme: Theme) -> Self
    where
        W: Write + IsTerminal + Send + 'static,
    {
        let interactive = sink.is_terminal();
        Self::assemble(Box::new(sink), theme, interactive)
    }

    /// A printer over stdout.
    pub fn stdout(theme: Theme) -> Self {
        Self::new(std::io::stdout(), theme)
    }

    /// A printer over a sink that is known not to be a terminal (pipes,
    /// capture buffers).
    pub fn pipe<W>(sink: W, theme: Theme) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::assemble(Box::new(sink), theme, false)
    }

    fn assemble(sink: Box<dyn Write + Send>, mut theme: Theme, interactive: bool) -> Self {
        if !interactive && !theme.force_colors {
            theme = Theme::minimal();
        }
        Self {
            inner: Mutex::new(Inner {
                sink,
                theme,
                interactive,
                transient: false,
            }),
        }
    }

    /// Whether the sink behaved like a terminal at construction.
    pub fn is_interactive(&self) -> bool {
        self.inner.lock().map(|inner| inner.interactive).unwrap_or(false)
    }

    /// A copy of the theme selected at construction.
    pub fn theme(&self) -> Theme {
        self.inner
            .lock()
            .map(|inner| inner.theme.clone())
            .unwrap_or_else(|_| Theme::minimal())
    }
}

impl fmt::Debug for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Printer")
            .field("interactive", &self.is_interactive())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Erase a pending transient header so the next line replaces it.
    fn clear_transient(&mut self) {
        if self.transient {
            let _ = self.sink.queue(MoveToColumn(0));
            let _ = self.sink.queue(Clear(ClearType::CurrentLine));
            self.transient = false;
        }
    }

    fn line(&mut self, text: &str) {
        self.clear_transient();
        let _ = writeln!(self.sink, "{text}");
        let _ = self.sink.flush();
    }
}

/// Shared outcome-line formatting for summaries and roll-ups.
fn result_line(theme: &Theme, name: &str, passed: bool, duration: Duration) -> String {
    let (icon, color) = if passed {
        (theme.icons.success, theme.colors.success)
    } else {
        (theme.icons.failure, theme.colors.error)
    };
    format!(
        "  {} {} {}",
        theme.paint(icon, color),
        name,
        theme.paint(&format!("({})", format_duration(duration)), theme.colors.secondary),
    )
}

impl Report for Printer {
    fn category_header(&self, title: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let label = format!(" {title} ");
        let fill = theme
            .header_width
            .saturating_sub(label.chars().count() + 4);
        let rule = format!(
            "{}{label}{}",
            theme.tree.rule.repeat(4),
            theme.tree.rule.repeat(fill)
        );
        inner.line("");
        inner.line(&theme.paint(&rule, theme.colors.header));
    }

    fn check_header(&self, message: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if !inner.interactive {
            return;
        }
        inner.clear_transient();
        let theme = inner.theme.clone();
        let text = format!(
            "  {} {}",
            theme.paint(theme.icons.pending, theme.colors.secondary),
            theme.paint(message, theme.colors.secondary),
        );
        let _ = write!(inner.sink, "{text}");
        let _ = inner.sink.flush();
        inner.transient = true;
    }

    fn check_success(&self, message: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let text = format!(
            "  {} {}",
            theme.paint(theme.icons.success, theme.colors.success),
            message,
        );
        inner.line(&text);
    }

    fn check_failure(&self, title: &str, details: &str, remediation: Option<&str>) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let mut block = format!(
            "  {} {}",
            theme.paint(theme.icons.failure, theme.colors.error),
            title,
        );
        for line in details.lines() {
            block.push('\n');
            block.push_str(&format!("    {line}"));
        }
        if let Some(remediation) = remediation {
            block.push('\n');
            block.push_str(&format!(
                "    {} {}",
                theme.paint(theme.icons.remediation, theme.colors.warning),
                theme.paint(remediation, theme.colors.warning),
            ));
        }
        inner.line(&block);
    }

    fn check_summary(&self, passed: bool, title: &str, lines: &[SummaryLine]) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let mut block = theme.paint(
            &theme.tree.rule.repeat(theme.summary_width),
            theme.colors.border,
        );
        block.push('\n');
        let headline = if passed {
            format!(
                "{} {title}: all {} checks passed",
                theme.paint(theme.icons.success, theme.colors.success),
                lines.len(),
            )
        } else {
            let failed = lines.iter().filter(|l| !l.passed).count();
            format!(
                "{} {title}: {failed} of {} checks failed",
                theme.paint(theme.icons.failure, theme.colors.error),
                lines.len(),
            )
        };
        block.push_str(&headline);
        for line in lines {
            block.push('\n');
            block.push_str(&result_line(&theme, &line.name, line.passed, line.duration));
        }
        inner.line(&block);
    }

    fn check_info(&self, lines: &[String]) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let block: Vec<String> = lines
            .iter()
            .map(|line| format!("    {} {line}", theme.paint(theme.icons.bullet, theme.colors.secondary)))
            .collect();
        inner.line(&block.join("\n"));
    }

    fn check_note(&self, message: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let text = format!("  {}", theme.paint(message, theme.colors.secondary));
        inner.line(&text);
    }

    fn check_line(&self, name: &str, passed: bool, duration: Duration) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let theme = inner.theme.clone();
        let text = result_line(&theme, name, passed, duration);
        inner.line(&text);
    }
}

/// A recorded invocation: method name plus ordered, stringified arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Trait method name.
    pub method: &'static str,
    /// Arguments in declaration order; `None` options record as `""`.
    pub args: Vec<String>,
}

/// Call-recording [`Report`] implementation. Produces no output.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<RecordedCall>>,
}

impl Recorder {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, in invocation order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Just the method names, in invocation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|c| c.method).collect())
            .unwrap_or_default()
    }

    fn push(&self, method: &'static str, args: Vec<String>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall { method, args });
        }
    }
}

impl Report for Recorder {
    fn category_header(&self, title: &str) {
        self.push("category_header", vec![title.to_string()]);
    }

    fn check_header(&self, message: &str) {
        self.push("check_header", vec![message.to_string()]);
    }

    fn check_success(&self, message: &str) {
        self.push("check_success", vec![message.to_string()]);
    }

    fn check_failure(&self, title: &str, details: &str, remediation: Option<&str>) {
        self.push(
            "check_failure",
            vec![
                title.to_string(),
                details.to_string(),
                remediation.unwrap_or_default().to_string(),
            ],
        );
    }

    fn check_summary(&self, passed: bool, title: &str, lines: &[SummaryLine]) {
        let mut args = vec![passed.to_string(), title.to_string()];
        args.extend(
            lines
                .iter()
                .map(|l| format!("{}:{}", l.name, if l.passed { "pass" } else { "fail" })),
        );
        self.push("check_summary", args);
    }

    fn check_info(&self, lines: &[String]) {
        self.push("check_info", lines.to_vec());
    }

    fn check_note(&self, message: &str) {
        self.push("check_note", vec![message.to_string()]);
    }

    fn check_line(&self, name: &str, passed: bool, duration: Duration) {
        self.push(
            "check_line",
            vec![
                name.to_string(),
                passed.to_string(),
                format_duration(duration),
            ],
        );
    }
}
