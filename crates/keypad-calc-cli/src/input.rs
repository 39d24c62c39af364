//! Keyboard input mapping
//!
//! Terminal keys and scripted characters are both turned into browser-style
//! key names first, so one table in [`Keypad::key_to_event`] decides what a
//! key does.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keypad_calc::core::Event;
use keypad_calc::keypad::Keypad;

use crate::error::{CliError, CliResult};

/// What a key press asks the interactive loop to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Feed an event to the session
    Key(Event),
    /// Show or hide the history list
    ToggleHistory,
    /// Load the newest history result
    RecallLatest,
    /// Delete the user's history
    ClearHistory,
    /// Sign out, or sign the configured user back in
    ToggleSignIn,
    /// Leave the loop
    Quit,
    /// Ignored input
    None,
}

/// Browser key name for a terminal key, if it has one
#[must_use]
pub fn key_name(code: KeyCode) -> Option<String> {
    match code {
        KeyCode::Char(c) => Some(c.to_string()),
        KeyCode::Enter => Some("Enter".to_string()),
        KeyCode::Backspace => Some("Backspace".to_string()),
        KeyCode::Esc => Some("Escape".to_string()),
        _ => None,
    }
}

/// Maps a terminal key event to a loop command
#[must_use]
pub fn map_key(event: KeyEvent) -> Command {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c' | 'q') => Command::Quit,
            _ => Command::None,
        };
    }

    match code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('h') => Command::ToggleHistory,
        KeyCode::Char('x') => Command::ClearHistory,
        KeyCode::Char('s') => Command::ToggleSignIn,
        KeyCode::Tab => Command::RecallLatest,
        code => key_name(code)
            .and_then(|name| Keypad::key_to_event(&name))
            .map_or(Command::None, Command::Key),
    }
}

/// Key name for one character of a `keys` script
///
/// Whitespace yields `Ok(None)`.
pub fn script_key(c: char) -> CliResult<Option<&'static str>> {
    let name = match c {
        c if c.is_whitespace() => return Ok(None),
        '0' => "0",
        '1' => "1",
        '2' => "2",
        '3' => "3",
        '4' => "4",
        '5' => "5",
        '6' => "6",
        '7' => "7",
        '8' => "8",
        '9' => "9",
        '.' => ".",
        '+' => "+",
        '-' => "-",
        '*' => "*",
        '/' => "/",
        '%' => "%",
        '=' => "=",
        'c' | 'C' => "Escape",
        '<' => "Backspace",
        other => {
            return Err(CliError::invalid_argument(format!(
                "unsupported key {other:?} (use 0-9 . + - * / % = c <)"
            )))
        }
    };
    Ok(Some(name))
}

/// Parses a `keys` script into events
pub fn parse_script(script: &str) -> CliResult<Vec<Event>> {
    let mut events = Vec::with_capacity(script.len());
    for c in script.chars() {
        let Some(name) = script_key(c)? else {
            continue;
        };
        let event = Keypad::key_to_event(name)
            .ok_or_else(|| CliError::invalid_argument(format!("unmapped key {name:?}")))?;
        events.push(event);
    }
    Ok(events)
}
