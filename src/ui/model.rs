//! Progress state machine and pure rendering.
//!
//! [`ProgressModel`] is owned exclusively by the actor's event loop; all
//! mutation happens through received messages, never through direct external
//! writes. Rendering functions are pure string builders so they can be
//! asserted on without a terminal.

use super::progress::{Spinner, format_bar, format_duration, truncate, wrap};
use super::theme::Theme;
use crossterm::style::Color;
use std::time::{Duration, Instant};

/// Width of the per-row progress bar, in cells.
const BAR_WIDTH: usize = 24;

/// Width of the name column in check rows.
const NAME_WIDTH: usize = 18;

/// Lifecycle of a single check row. `Passed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Queued, not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Passed,
    /// Finished with a failure.
    Failed,
}

impl CheckState {
    /// Whether this state ends the row's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

/// One state transition for a check row.
#[derive(Debug, Clone)]
pub struct CheckUpdate {
    /// Position of the check in the registered order.
    pub index: usize,
    /// New state for the row.
    pub state: CheckState,
    /// Fill fraction in `[0, 1]`; ignored for terminal states (snaps to 1).
    pub fraction: f64,
    /// Elapsed duration, once known.
    pub duration: Option<Duration>,
    /// Error text for a failed check.
    pub error: Option<String>,
    /// Remediation guidance for a failed check.
    pub remediation: Option<String>,
}

impl CheckUpdate {
    /// A fractional progress sample for a running check.
    pub fn running(index: usize, fraction: f64) -> Self {
        Self {
            index,
            state: CheckState::Running,
            fraction,
            duration: None,
            error: None,
            remediation: None,
        }
    }

    /// The terminal update for a finished check.
    pub fn finished(
        index: usize,
        passed: bool,
        duration: Duration,
        error: Option<String>,
        remediation: Option<String>,
    ) -> Self {
        Self {
            index,
            state: if passed {
                CheckState::Passed
            } else {
                CheckState::Failed
            },
            fraction: 1.0,
            duration: Some(duration),
            error,
            remediation,
        }
    }
}

/// Messages accepted by the progress actor's event loop.
#[derive(Debug)]
pub enum ProgressMsg {
    /// Start ticking and reserve the render region.
    Init,
    /// Apply a per-check state transition.
    Update(CheckUpdate),
    /// Record a coverage percentage for the final summary.
    Coverage(f64),
    /// All checks finished; render the summary (unless suppressed) and exit.
    Done,
    /// Terminate the render loop immediately.
    Quit,
    /// Acknowledge once all prior messages are processed.
    Sync(tokio::sync::oneshot::Sender<()>),
}

/// Live display state for one check.
#[derive(Debug, Clone)]
pub struct CheckProgress {
    /// Display name.
    pub name: String,
    /// Current lifecycle state.
    pub state: CheckState,
    /// Bar fill fraction in `[0, 1]`.
    pub fraction: f64,
    /// Elapsed duration, once known.
    pub duration: Option<Duration>,
    /// Error text for a failed check.
    pub error: Option<String>,
    /// Remediation guidance for a failed check.
    pub remediation: Option<String>,
}

/// What a display line carries: a check row, or the inline error note
/// inserted beneath a failed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// The row for check `index`.
    Check(usize),
    /// The truncated error line beneath failed check `index`.
    ErrorNote(usize),
}

/// Interactive state machine for one category of checks.
#[derive(Debug)]
pub struct ProgressModel {
    title: String,
    checks: Vec<CheckProgress>,
    lines: Vec<Line>,
    coverage: Option<f64>,
    done: bool,
    skip_summary: bool,
    spinner: Spinner,
    started: Option<Instant>,
}

impl ProgressModel {
    /// Build the model with every check pending.
    pub fn new(title: impl Into<String>, names: Vec<String>, skip_summary: bool) -> Self {
        let checks: Vec<CheckProgress> = names
            .into_iter()
            .map(|name| CheckProgress {
                name,
                state: CheckState::Pending,
                fraction: 0.0,
                duration: None,
                error: None,
                remediation: None,
            })
            .collect();
        let lines = (0..checks.len()).map(Line::Check).collect();
        Self {
            title: title.into(),
            checks,
            lines,
            coverage: None,
            done: false,
            skip_summary,
            spinner: Spinner::default(),
            started: None,
        }
    }

    /// Mark the start of the run (total duration is measured from here).
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Advance the spinner animation.
    pub fn tick(&mut self) {
        self.spinner.tick();
    }

    /// Record the coverage percentage shown in the summary.
    pub fn set_coverage(&mut self, percent: f64) {
        self.coverage = Some(percent.clamp(0.0, 100.0));
    }

    /// Mark the whole run as finished.
    pub fn finish(&mut self) {
        self.done = true;
    }

    /// Whether the `Done` message has been processed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the final summary box is suppressed.
    pub fn skip_summary(&self) -> bool {
        self.skip_summary
    }

    /// Display lines in render order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of display lines currently needed.
    pub fn line_count(&self) -> u16 {
        self.lines.len() as u16
    }

    /// The checks in registered order.
    pub fn checks(&self) -> &[CheckProgress] {
        &self.checks
    }

    /// Apply one state transition. Returns `true` when a new display line
    /// was inserted (the frame must grow by one).
    ///
    /// Terminal states are sticky: a stale `Running` sample arriving after
    /// the real result is dropped.
    pub fn apply(&mut self, update: CheckUpdate) -> bool {
        let Some(row) = self.checks.get_mut(update.index) else {
            return false;
        };
        if row.state.is_terminal() && !update.state.is_terminal() {
            return false;
        }

        row.state = update.state;
        row.fraction = if update.state.is_terminal() {
            1.0
        } else {
            update.fraction.clamp(0.0, 1.0)
        };
        if update.duration.is_some() {
            row.duration = update.duration;
        }
        if update.error.is_some() {
            row.error = update.error;
        }
        if update.remediation.is_some() {
            row.remediation = update.remediation;
        }

        if update.state == CheckState::Failed
            && row.error.is_some()
            && !self.lines.contains(&Line::ErrorNote(update.index))
        {
            let position = self
                .lines
                .iter()
                .position(|line| *line == Line::Check(update.index));
            match position {
                Some(at) => self.lines.insert(at + 1, Line::ErrorNote(update.index)),
                None => self.lines.push(Line::ErrorNote(update.index)),
            }
            return true;
        }
        false
    }

    /// Render one display line as a styled string.
    pub fn render_line(&self, line: Line, theme: &Theme) -> String {
        match line {
            Line::Check(index) => self.render_check_row(&self.checks[index], theme),
            Line::ErrorNote(index) => {
                let row = &self.checks[index];
                let text = row.error.as_deref().unwrap_or_default();
                let note = truncate(text, theme.summary_width);
                format!("      {}", theme.paint(&note, theme.colors.error))
            }
        }
    }

    fn render_check_row(&self, row: &CheckProgress, theme: &Theme) -> String {
        let (glyph, color) = match row.state {
            CheckState::Pending => (theme.icons.pending, theme.colors.secondary),
            CheckState::Running => (self.spinner.glyph(), theme.colors.active),
            CheckState::Passed => (theme.icons.success, theme.colors.success),
            CheckState::Failed => (theme.icons.failure, theme.colors.error),
        };
        let bar = theme.paint(&format_bar(row.fraction, BAR_WIDTH), color);
        let name = format!("{: <NAME_WIDTH$}", row.name);
        let elapsed = row
            .duration
            .map(|d| theme.paint(&format_duration(d), theme.colors.secondary))
            .unwrap_or_default();
        format!("  {} {} {} {}", theme.paint(glyph, color), name, bar, elapsed)
    }

    /// Render the bordered final summary.
    pub fn render_summary(&self, theme: &Theme) -> Vec<String> {
        let width = theme.summary_width;
        let inner = width.saturating_sub(4);
        let border = |text: &str| theme.paint(text, theme.colors.border);

        let mut out = Vec::new();

        // Top border with embedded title.
        let label = format!(" {} ", self.title);
        let fill = width.saturating_sub(3 + label.chars().count());
        out.push(border(&format!(
            "{}{}{label}{}{}",
            theme.borders.top_left,
            theme.borders.horizontal,
            theme.borders.horizontal.repeat(fill),
            theme.borders.top_right,
        )));

        let failed: Vec<&CheckProgress> = self
            .checks
            .iter()
            .filter(|c| c.state == CheckState::Failed)
            .collect();

        let headline_color;
        let headline;
        if failed.is_empty() {
            headline_color = theme.colors.success;
            headline = format!(
                "{} All {} checks passed",
                theme.icons.success,
                self.checks.len()
            );
        } else {
            headline_color = theme.colors.error;
            headline = format!(
                "{} {} of {} checks failed",
                theme.icons.failure,
                failed.len(),
                self.checks.len()
            );
        }
        out.push(self.frame_line(theme, &headline, Some(headline_color), inner));
        out.push(self.frame_line(theme, "", None, inner));

        for check in &self.checks {
            let (icon, color) = match check.state {
                CheckState::Passed => (theme.icons.success, theme.colors.success),
                CheckState::Failed => (theme.icons.failure, theme.colors.error),
                _ => (theme.icons.pending, theme.colors.secondary),
            };
            let elapsed = check.duration.map(format_duration).unwrap_or_default();
            let name = format!("{: <NAME_WIDTH$}", check.name);
            let text = format!("{icon} {name} {elapsed}");
            out.push(self.frame_line(theme, &text, Some(color), inner));
        }

        if !failed.is_empty() {
            out.push(self.frame_line(theme, "", None, inner));
            out.push(self.frame_line(theme, "Errors", None, inner));
            for check in &failed {
                let error = check.error.as_deref().unwrap_or_default();
                for line in wrap(&format!("{}: {}", check.name, error), inner.saturating_sub(2)) {
                    let text = format!("  {line}");
                    out.push(self.frame_line(theme, &text, Some(theme.colors.error), inner));
                }
                if let Some(remediation) = &check.remediation {
                    let lead = format!("{} {}", theme.icons.remediation, remediation);
                    for line in wrap(&lead, inner.saturating_sub(4)) {
                        let text = format!("    {line}");
                        out.push(self.frame_line(theme, &text, Some(theme.colors.warning), inner));
                    }
                }
            }
        }

        if let Some(percent) = self.coverage {
            out.push(self.frame_line(theme, "", None, inner));
            let bar = format_bar(percent / 100.0, BAR_WIDTH);
            let text = format!("Coverage {bar} {percent:.0}%");
            out.push(self.frame_line(theme, &text, None, inner));
        }

        let total = self.started.map(|s| s.elapsed()).unwrap_or_default();
        out.push(self.frame_line(theme, "", None, inner));
        let text = format!("Total {}", format_duration(total));
        out.push(self.frame_line(theme, &text, None, inner));

        out.push(border(&format!(
            "{}{}{}",
            theme.borders.bottom_left,
            theme.borders.horizontal.repeat(width.saturating_sub(2)),
            theme.borders.bottom_right,
        )));

        out
    }

    fn frame_line(
        &self,
        theme: &Theme,
        content: &str,
        color: Option<Color>,
        inner: usize,
    ) -> String {
        let pad = inner.saturating_sub(content.chars().count());
        let padded = format!("{content}{}", " ".repeat(pad));
        let painted = match color {
            Some(color) => theme.paint(&padded, color),
            None => padded,
        };
        format!(
            "{} {} {}",
            theme.paint(theme.borders.vertical, theme.colors.border),
            painted,
            theme.paint(theme.borders.vertical, theme.colors.border),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(names: &[&str]) -> ProgressModel {
        ProgressModel::new(
            "Checks",
            names.iter().map(|n| (*n).to_string()).collect(),
            false,
        )
    }

    #[test]
    fn rows_start_pending_with_one_line_each() {
        let model = model(&["a", "b"]);
        assert_eq!(model.line_count(), 2);
        assert!(
            model
                .checks()
                .iter()
                .all(|c| c.state == CheckState::Pending)
        );
    }

    #[test]
    fn running_fraction_is_clamped() {
        let mut model = model(&["a"]);
        model.apply(CheckUpdate::running(0, 3.0));
        assert!((model.checks()[0].fraction - 1.0).abs() < f64::EPSILON);
        model.apply(CheckUpdate::running(0, -1.0));
        assert!(model.checks()[0].fraction.abs() < f64::EPSILON);
    }

    #[test]
    fn terminal_update_snaps_fraction_to_one() {
        let mut model = model(&["a"]);
        model.apply(CheckUpdate::running(0, 0.4));
        model.apply(CheckUpdate::finished(
            0,
            true,
            Duration::from_millis(120),
            None,
            None,
        ));
        let row = &model.checks()[0];
        assert_eq!(row.state, CheckState::Passed);
        assert!((row.fraction - 1.0).abs() < f64::EPSILON);
        assert_eq!(row.duration, Some(Duration::from_millis(120)));
    }

    #[test]
    fn stale_running_sample_cannot_unfinish_a_row() {
        let mut model = model(&["a"]);
        model.apply(CheckUpdate::finished(
            0,
            false,
            Duration::from_secs(1),
            Some("boom".into()),
            None,
        ));
        model.apply(CheckUpdate::running(0, 0.5));
        let row = &model.checks()[0];
        assert_eq!(row.state, CheckState::Failed);
        assert!((row.fraction - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_inserts_exactly_one_error_line() {
        let mut model = model(&["a", "b"]);
        let grew = model.apply(CheckUpdate::finished(
            0,
            false,
            Duration::from_secs(1),
            Some("exploded".into()),
            None,
        ));
        assert!(grew);
        assert_eq!(model.line_count(), 3);
        assert_eq!(
            model.lines(),
            &[Line::Check(0), Line::ErrorNote(0), Line::Check(1)]
        );

        // Re-applying the terminal update must not insert another line.
        let grew_again = model.apply(CheckUpdate::finished(
            0,
            false,
            Duration::from_secs(1),
            Some("exploded".into()),
            None,
        ));
        assert!(!grew_again);
        assert_eq!(model.line_count(), 3);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut model = model(&["a"]);
        assert!(!model.apply(CheckUpdate::running(9, 0.5)));
    }

    #[test]
    fn summary_reports_all_passed() {
        let theme = Theme::minimal();
        let mut model = model(&["format", "lint"]);
        model.start();
        model.apply(CheckUpdate::finished(
            0,
            true,
            Duration::from_millis(900),
            None,
            None,
        ));
        model.apply(CheckUpdate::finished(
            1,
            true,
            Duration::from_secs(2),
            None,
            None,
        ));
        model.finish();

        let summary = model.render_summary(&theme).join("\n");
        assert!(summary.contains("All 2 checks passed"));
        assert!(summary.contains("format"));
        assert!(summary.contains("Total "));
        assert!(!summary.contains("Errors"));
    }

    #[test]
    fn summary_lists_wrapped_errors_and_remediation() {
        let theme = Theme::minimal();
        let mut model = model(&["lint"]);
        model.start();
        model.apply(CheckUpdate::finished(
            0,
            false,
            Duration::from_secs(3),
            Some("a deliberately long error message that will certainly wrap across the summary box".into()),
            Some("run the linter with --fix".into()),
        ));
        model.finish();

        let lines = model.render_summary(&theme);
        let summary = lines.join("\n");
        assert!(summary.contains("1 of 1 checks failed"));
        assert!(summary.contains("Errors"));
        assert!(summary.contains("run the linter with --fix"));
        // Every rendered line fits the box width.
        for line in &lines {
            assert_eq!(line.chars().count(), theme.summary_width);
        }
    }

    #[test]
    fn tiny_summary_width_still_renders_errors() {
        let mut theme = Theme::minimal();
        theme.summary_width = 6;
        let mut model = model(&["lint"]);
        model.start();
        model.apply(CheckUpdate::finished(
            0,
            false,
            Duration::from_secs(1),
            Some("boom".into()),
            Some("fix it".into()),
        ));
        model.finish();
        // Must not underflow the wrap widths; every error character still
        // comes out, one per hard-split line.
        let lines = model.render_summary(&theme);
        let glued: String = lines.iter().flat_map(|l| l.chars()).collect();
        for ch in "boom".chars() {
            assert!(glued.contains(ch));
        }
    }

    #[test]
    fn summary_includes_the_coverage_bar() {
        let theme = Theme::minimal();
        let mut model = model(&["test"]);
        model.start();
        model.set_coverage(62.0);
        model.apply(CheckUpdate::finished(
            0,
            true,
            Duration::from_secs(1),
            None,
            None,
        ));
        model.finish();
        let summary = model.render_summary(&theme).join("\n");
        assert!(summary.contains("Coverage"));
        assert!(summary.contains("62%"));
    }
}
