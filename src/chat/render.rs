//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction.  After every
//! command the whole session is re-rendered from state: header, decision
//! context, transcript, onboarding when idle, footer.  The default
//! implementation writes plain text with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::chat::reducer::{Notice, NoticeLevel};
use crate::chat::scenarios::Scenario;
use crate::chat::session::{Session, SessionPhase};
use crate::types::Role;

/// ANSI escape code for bold text (used for the header).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for hints and the footer).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape codes to clear the screen and home the cursor.
const ANSI_CLEAR: &str = "\x1b[2J\x1b[H";

/// Placeholder shown when no decision context is set.
pub const CONTEXT_PLACEHOLDER: &str =
    "e.g., Should I change careers? Which apartment should I rent? What should I study in college?";

/// Habits that lead to good decisions, shown by `/tips`.
pub const DECISION_TIPS: [&str; 7] = [
    "Clearly defining the problem",
    "Identifying your values and priorities",
    "Considering multiple options",
    "Weighing pros and cons",
    "Thinking about long-term consequences",
    "Getting input from trusted sources",
    "Setting a decision deadline",
];

/// Closing line of every render.
pub const FOOTER: &str = "Decidr helps you make better decisions through AI-powered conversation. Remember, the final decision is always yours!";

const RULE: &str = "----------------------------------------";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Re-render the whole session from state.
    fn render(&mut self, session: &Session);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a notice produced by a transition.
    fn print_notice(&mut self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => self.print_info(&notice.text),
            NoticeLevel::Error => self.print_error(&notice.text),
        }
    }

    /// Print the decision tips panel.
    fn print_tips(&mut self);

    /// Print the example scenarios.
    fn print_scenarios(&mut self);

    /// Called just before a request is sent; `label` says what is happening.
    fn start_request(&mut self, label: &str);

    /// Called when the request has finished, failed or been cancelled.
    fn finish_request(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new renderer on stdout with colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new renderer on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Whether ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&mut self, style: &str, text: &str) {
        if self.use_color {
            _ = write!(self.out, "{style}{text}{ANSI_RESET}");
        } else {
            _ = write!(self.out, "{text}");
        }
    }

    fn line(&mut self, text: &str) {
        _ = writeln!(self.out, "{text}");
    }

    fn flush(&mut self) {
        _ = self.out.flush();
    }

    fn render_header(&mut self, session: &Session) {
        self.styled(ANSI_BOLD, "Decidr");
        self.line(" - Your AI-powered decision-making assistant");
        if session.decision_context().is_empty() {
            self.line("Decision: (not set)");
            self.styled(ANSI_DIM, &format!("  /context {CONTEXT_PLACEHOLDER}"));
            self.line("");
        } else {
            self.line(&format!("Decision: {}", session.decision_context()));
        }
        self.line(RULE);
    }

    fn render_transcript(&mut self, session: &Session) {
        for message in session.messages() {
            let (label, style) = match message.role {
                Role::User => ("You:", ANSI_CYAN),
                Role::Assistant => ("Decidr:", ANSI_GREEN),
                Role::System => continue,
            };
            self.styled(style, label);
            self.line("");
            for text in message.content.lines() {
                self.line(&format!("  {text}"));
            }
            self.line("");
        }
    }

    fn render_onboarding(&mut self) {
        self.line("Get Started");
        self.line("To begin, either:");
        self.line("  1. Describe your decision with /context <text> and run /new");
        self.line("  2. Ask a question directly below");
        self.line("");
        self.print_scenarios();
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn render(&mut self, session: &Session) {
        if self.use_color {
            _ = write!(self.out, "{ANSI_CLEAR}");
        }
        self.render_header(session);
        match session.phase() {
            SessionPhase::Idle => self.render_onboarding(),
            SessionPhase::Active => self.render_transcript(session),
        }
        self.line(RULE);
        self.styled(ANSI_DIM, FOOTER);
        self.line("");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.styled(ANSI_RED, &format!("Error: {error}"));
        self.line("");
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.line(info);
        self.flush();
    }

    fn print_tips(&mut self) {
        self.line("Decision Tips");
        self.line("Good decisions often involve:");
        for tip in DECISION_TIPS {
            self.line(&format!("  - {tip}"));
        }
        self.flush();
    }

    fn print_scenarios(&mut self) {
        self.line("Example Decision Scenarios");
        for scenario in Scenario::ALL {
            self.line(&format!(
                "  /example {}  {}",
                scenario.number(),
                scenario.label()
            ));
        }
        self.flush();
    }

    fn start_request(&mut self, label: &str) {
        self.styled(ANSI_DIM, label);
        self.line("");
        self.flush();
    }

    fn finish_request(&mut self) {
        self.flush();
    }
}
