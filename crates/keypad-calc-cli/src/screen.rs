//! Full-screen terminal rendering for the interactive keypad

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue, style::Print};
use futures::StreamExt;
use keypad_calc::core::Display;
use keypad_calc::history::{HistoryRecord, HistorySink};
use keypad_calc::identity::UserProfile;
use keypad_calc::keypad::{Keypad, KeypadButton};
use keypad_calc::session::DisplaySurface;
use tokio::task::JoinHandle;

const DISPLAY_WIDTH: usize = 22;
const CELL_WIDTH: usize = 6;
const HISTORY_ROWS: usize = 8;
const HELP: &str = "q quit · h history · Tab load newest · x clear history · s sign in/out";

/// Puts the terminal in raw mode on an alternate screen until dropped
#[derive(Debug)]
pub struct RawModeGuard;

impl RawModeGuard {
    /// Enters raw mode
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// Latest history snapshot for one user, kept current by a background task
#[derive(Debug)]
pub struct HistoryFeed {
    records: Arc<Mutex<Vec<HistoryRecord>>>,
    task: Option<JoinHandle<()>>,
}

impl HistoryFeed {
    /// Subscribes to `user`'s history; signed out gives an empty feed
    ///
    /// Must be called inside a tokio runtime.
    pub fn watch(sink: &dyn HistorySink, user: Option<&UserProfile>) -> Self {
        let records = Arc::new(Mutex::new(Vec::new()));
        let task = user.map(|user| {
            let mut snapshots = sink.subscribe(&user.uid);
            let records = Arc::clone(&records);
            tokio::spawn(async move {
                while let Some(snapshot) = snapshots.next().await {
                    *records.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
                }
            })
        });
        Self { records, task }
    }

    /// Current snapshot, newest first
    #[must_use]
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Newest record
    #[must_use]
    pub fn latest(&self) -> Option<HistoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .cloned()
    }
}

impl Drop for HistoryFeed {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Interactive display surface
///
/// `render` only stores the frame; [`Screen::draw`] paints it.
#[derive(Debug)]
pub struct Screen {
    out: Stdout,
    display: Display,
    keypad: Keypad,
    user_label: Option<String>,
    show_history: bool,
}

impl Screen {
    /// Create a screen for `user`
    #[must_use]
    pub fn new(user: Option<&UserProfile>) -> Self {
        Self {
            out: io::stdout(),
            display: Display::default(),
            keypad: Keypad::new(),
            user_label: user.map(|u| u.label().to_string()),
            show_history: false,
        }
    }

    /// Updates the header after a sign-in or sign-out
    pub fn set_user(&mut self, user: Option<&UserProfile>) {
        self.user_label = user.map(|u| u.label().to_string());
    }

    /// Shows or hides the history list
    pub fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
    }

    /// Whether the history list is shown
    #[must_use]
    pub const fn history_visible(&self) -> bool {
        self.show_history
    }

    /// The frame as text lines
    #[must_use]
    pub fn lines(&self, toast: Option<&str>, history: &[HistoryRecord]) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(match &self.user_label {
            Some(label) => format!("keypad-calc · {label}"),
            None => "keypad-calc · guest (history off)".to_string(),
        });

        let border = "─".repeat(DISPLAY_WIDTH + 2);
        lines.push(format!("┌{border}┐"));
        lines.push(format!(
            "│ {:>width$} │",
            fit(&self.display.secondary, DISPLAY_WIDTH),
            width = DISPLAY_WIDTH
        ));
        lines.push(format!(
            "│ {:>width$} │",
            fit(&self.display.primary, DISPLAY_WIDTH),
            width = DISPLAY_WIDTH
        ));
        lines.push(format!("└{border}┘"));

        let (rows, _) = self.keypad.dimensions();
        for row in 0..rows {
            lines.push(
                self.keypad
                    .row(row)
                    .map(button_cell)
                    .collect::<String>()
                    .trim_end()
                    .to_string(),
            );
        }

        lines.push(toast.unwrap_or_default().to_string());

        if self.show_history {
            lines.push("History".to_string());
            if self.user_label.is_none() {
                lines.push("  Please sign in first".to_string());
            } else if history.is_empty() {
                lines.push(format!("  {}", crate::output::NO_CALCULATIONS));
            } else {
                lines.extend(
                    history
                        .iter()
                        .take(HISTORY_ROWS)
                        .map(|record| format!("  {}  {}", record, record.time_label())),
                );
            }
        }

        lines.push(HELP.to_string());
        lines
    }

    /// Paints the frame
    pub fn draw(&mut self, toast: Option<&str>, history: &[HistoryRecord]) -> io::Result<()> {
        let lines = self.lines(toast, history);
        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(self.out, MoveTo(0, row), Print(line))?;
        }
        self.out.flush()
    }
}

impl DisplaySurface for Screen {
    fn render(&mut self, display: &Display) {
        self.display = display.clone();
    }
}

fn button_cell(button: &KeypadButton) -> String {
    let width = CELL_WIDTH * button.span;
    format!("{:^width$}", format!("[{}]", button.label()))
}

/// Keeps the last `width` characters, marking the cut with an ellipsis
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    let tail: String = text.chars().skip(len + 1 - width).collect();
    format!("…{tail}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use keypad_calc::history::HistoryStore;

    fn screen_with(display: Display, user: Option<&UserProfile>) -> Screen {
        let mut screen = Screen::new(user);
        screen.render(&display);
        screen
    }

    #[test]
    fn test_fit_short_text() {
        assert_eq!(fit("123", 5), "123");
    }

    #[test]
    fn test_fit_long_text() {
        let fitted = fit("1234567890", 5);
        assert_eq!(fitted, "…7890");
        assert_eq!(fitted.chars().count(), 5);
    }

    #[test]
    fn test_lines_show_display() {
        let display = Display {
            primary: "3".to_string(),
            secondary: "12 +".to_string(),
        };
        let screen = screen_with(display, None);
        let lines = screen.lines(None, &[]);
        assert!(lines[0].contains("guest"));
        assert!(lines[2].trim_end_matches(" │").ends_with("12 +"));
        assert!(lines[3].trim_end_matches(" │").ends_with('3'));
    }

    #[test]
    fn test_lines_show_keypad_rows() {
        let screen = Screen::new(None);
        let lines = screen.lines(None, &[]);
        assert!(lines[5].contains("[C]"));
        assert!(lines[5].contains("[÷]"));
        assert!(lines[9].contains("[0]"));
        assert!(lines[9].contains("[=]"));
    }

    #[test]
    fn test_lines_show_toast_and_help() {
        let screen = Screen::new(None);
        let lines = screen.lines(Some("Cannot divide by zero"), &[]);
        assert!(lines.iter().any(|l| l == "Cannot divide by zero"));
        assert_eq!(lines.last().map(String::as_str), Some(HELP));
    }

    #[test]
    fn test_history_panel() {
        let user = UserProfile::new("u1").with_display_name("Ada");
        let mut screen = Screen::new(Some(&user));
        assert!(!screen.history_visible());
        screen.toggle_history();
        let lines = screen.lines(None, &[]);
        assert!(lines[0].contains("Ada"));
        assert!(lines.iter().any(|l| l.contains("No calculations yet")));

        let lines = screen.lines(None, &[HistoryRecord::with_timestamp("2 + 3", 5.0, None)]);
        assert!(lines.iter().any(|l| l.contains("2 + 3 = 5") && l.contains("Just now")));
    }

    #[test]
    fn test_set_user_updates_header() {
        let mut screen = Screen::new(None);
        screen.set_user(Some(&UserProfile::new("u1").with_email("ada@example.com")));
        assert!(screen.lines(None, &[])[0].contains("ada@example.com"));
        screen.set_user(None);
        assert!(screen.lines(None, &[])[0].contains("guest"));
    }

    #[test]
    fn test_history_panel_signed_out() {
        let mut screen = Screen::new(None);
        screen.toggle_history();
        let lines = screen.lines(None, &[]);
        assert!(lines.iter().any(|l| l.contains("Please sign in first")));
    }

    #[tokio::test]
    async fn test_history_feed_follows_store() {
        let store = HistoryStore::in_memory(10);
        let user = UserProfile::new("u1");
        let feed = HistoryFeed::watch(&store, Some(&user));

        store.record("u1", "1 + 1", 2.0).await.unwrap();
        for _ in 0..50 {
            if feed.latest().is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(feed.latest().map(|r| r.result), Some(2.0));
        assert_eq!(feed.records().len(), 1);
    }

    #[tokio::test]
    async fn test_history_feed_signed_out() {
        let store = HistoryStore::in_memory(10);
        let feed = HistoryFeed::watch(&store, None);
        assert!(feed.records().is_empty());
        assert!(feed.latest().is_none());
    }
}
