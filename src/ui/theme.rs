//! Theme - glyph and style configuration.
//!
//! Two variants: [`Theme::decorated`] for interactive terminals and
//! [`Theme::minimal`] (plain glyphs, no color) for pipes, CI logs, and
//! capture buffers. A theme is an immutable value; the printer selects one
//! at construction and never changes it afterwards.

use crossterm::style::{Color, Stylize};

/// Glyph/style set controlling how check events are rendered.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Status icons.
    pub icons: Icons,
    /// Tree connectors and rule glyphs.
    pub tree: TreeGlyphs,
    /// Box-drawing glyphs for the summary border.
    pub borders: Borders,
    /// Colors for different UI elements.
    pub colors: ColorScheme,
    /// Width of category header rules.
    pub header_width: usize,
    /// Width of the bordered summary box.
    pub summary_width: usize,
    /// Keep colors even when the sink is not a terminal.
    pub force_colors: bool,
    colors_enabled: bool,
}

impl Theme {
    /// The full decorated theme for interactive terminals.
    pub fn decorated() -> Self {
        Self {
            icons: Icons::decorated(),
            tree: TreeGlyphs::decorated(),
            borders: Borders::decorated(),
            colors: ColorScheme::default(),
            header_width: 60,
            summary_width: 64,
            force_colors: false,
            colors_enabled: true,
        }
    }

    /// Plain-glyph, colorless theme for non-interactive sinks.
    pub fn minimal() -> Self {
        Self {
            icons: Icons::minimal(),
            tree: TreeGlyphs::minimal(),
            borders: Borders::minimal(),
            colors: ColorScheme::default(),
            header_width: 60,
            summary_width: 64,
            force_colors: false,
            colors_enabled: false,
        }
    }

    /// Keep ANSI colors even on a non-terminal sink.
    pub fn force_colors(mut self, enabled: bool) -> Self {
        self.force_colors = enabled;
        self
    }

    /// Whether [`Theme::paint`] emits ANSI sequences.
    pub fn colors_enabled(&self) -> bool {
        self.colors_enabled
    }

    /// Wrap `text` in the given color, or return it untouched when colors
    /// are disabled.
    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.colors_enabled {
            format!("{}", text.with(color))
        } else {
            text.to_string()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::decorated()
    }
}

/// Status icons for check states and annotations.
#[derive(Debug, Clone)]
pub struct Icons {
    /// Queued, not yet started.
    pub pending: &'static str,
    /// Completed successfully.
    pub success: &'static str,
    /// Completed with a failure.
    pub failure: &'static str,
    /// List bullet for info lines.
    pub bullet: &'static str,
    /// Remediation arrow.
    pub remediation: &'static str,
}

impl Icons {
    fn decorated() -> Self {
        Self {
            pending: "○",
            success: "✓",
            failure: "✗",
            bullet: "•",
            remediation: "↳",
        }
    }

    fn minimal() -> Self {
        Self {
            pending: "-",
            success: "+",
            failure: "x",
            bullet: "*",
            remediation: ">",
        }
    }
}

/// Tree connectors and horizontal rules.
#[derive(Debug, Clone)]
pub struct TreeGlyphs {
    /// Mid-list connector.
    pub branch: &'static str,
    /// Final-item connector.
    pub last: &'static str,
    /// Horizontal rule segment.
    pub rule: &'static str,
}

impl TreeGlyphs {
    fn decorated() -> Self {
        Self {
            branch: "├─",
            last: "└─",
            rule: "─",
        }
    }

    fn minimal() -> Self {
        Self {
            branch: "|-",
            last: "`-",
            rule: "-",
        }
    }
}

/// Box-drawing glyphs for the summary border.
#[derive(Debug, Clone)]
pub struct Borders {
    /// Top-left corner.
    pub top_left: &'static str,
    /// Top-right corner.
    pub top_right: &'static str,
    /// Bottom-left corner.
    pub bottom_left: &'static str,
    /// Bottom-right corner.
    pub bottom_right: &'static str,
    /// Horizontal edge segment.
    pub horizontal: &'static str,
    /// Vertical edge segment.
    pub vertical: &'static str,
}

impl Borders {
    fn decorated() -> Self {
        Self {
            top_left: "╭",
            top_right: "╮",
            bottom_left: "╰",
            bottom_right: "╯",
            horizontal: "─",
            vertical: "│",
        }
    }

    fn minimal() -> Self {
        Self {
            top_left: "+",
            top_right: "+",
            bottom_left: "+",
            bottom_right: "+",
            horizontal: "-",
            vertical: "|",
        }
    }
}

/// Color scheme for UI elements.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Success states.
    pub success: Color,
    /// Failure states.
    pub error: Color,
    /// Remediation and caution text.
    pub warning: Color,
    /// Active/in-progress items.
    pub active: Color,
    /// Secondary info (pending rows, durations).
    pub secondary: Color,
    /// Headers and labels.
    pub header: Color,
    /// Borders and separators.
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            active: Color::Cyan,
            secondary: Color::DarkGrey,
            header: Color::DarkGrey,
            border: Color::DarkGrey,
        }
    }
}
