//! Line-oriented output for non-interactive commands

use console::{style, Term};
use keypad_calc::core::Display;
use keypad_calc::history::HistoryRecord;
use keypad_calc::notify::Notifier;
use keypad_calc::session::DisplaySurface;

/// Shown when the user has no saved calculations
pub const NO_CALCULATIONS: &str = "No calculations yet. Start calculating!";

/// Display on one line: `secondary | primary`, or just the primary
#[must_use]
pub fn one_line(display: &Display) -> String {
    if display.secondary.is_empty() {
        display.primary.clone()
    } else {
        format!("{} | {}", display.secondary, display.primary)
    }
}

/// One history entry as a line of text
#[must_use]
pub fn history_line(record: &HistoryRecord) -> String {
    format!(
        "{}  {}  {}",
        record.expression,
        style(record.result_label()).bold(),
        style(record.time_label()).dim()
    )
}

/// Writes notices to stderr
#[derive(Debug)]
pub struct ConsoleNotifier {
    term: Term,
    quiet: bool,
}

impl ConsoleNotifier {
    /// Create a notifier; `quiet` drops every notice
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            quiet,
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self
            .term
            .write_line(&style(message).yellow().for_stderr().to_string());
    }
}

/// Display surface for scripted runs
///
/// Keeps the last frame and, when tracing, prints every frame to stdout.
#[derive(Debug)]
pub struct ConsoleSurface {
    term: Term,
    trace: bool,
    last: Option<Display>,
}

impl ConsoleSurface {
    /// Create a surface
    #[must_use]
    pub fn new(trace: bool) -> Self {
        Self {
            term: Term::stdout(),
            trace,
            last: None,
        }
    }

    /// The last rendered frame
    #[must_use]
    pub fn last(&self) -> Option<&Display> {
        self.last.as_ref()
    }

    /// Prints the last frame in full
    pub fn print_final(&self) -> std::io::Result<()> {
        match &self.last {
            Some(display) => self.term.write_line(&display.to_string()),
            None => Ok(()),
        }
    }
}

impl DisplaySurface for ConsoleSurface {
    fn render(&mut self, display: &Display) {
        if self.trace {
            let _ = self.term.write_line(&one_line(display));
        }
        self.last = Some(display.clone());
    }
}
