//! Keypad layout and key mapping
//!
//! Layout:
//! ```text
//! [ C ] [ ⌫ ] [ % ] [ ÷ ]
//! [ 7 ] [ 8 ] [ 9 ] [ × ]
//! [ 4 ] [ 5 ] [ 6 ] [ − ]
//! [ 1 ] [ 2 ] [ 3 ] [ + ]
//! [   0     ] [ . ] [ = ]
//! ```

use crate::core::{Action, DigitToken, Event, Operator};

/// A single keypad button
#[derive(Debug, Clone, PartialEq)]
pub struct KeypadButton {
    /// Event the button produces
    pub event: Event,
    /// Element id, e.g. `btn-7`
    pub id: String,
    /// Grid row (0-indexed)
    pub row: usize,
    /// First grid column (0-indexed)
    pub col: usize,
    /// Number of columns covered
    pub span: usize,
}

impl KeypadButton {
    /// Creates a one-column button
    #[must_use]
    pub fn new(event: Event, row: usize, col: usize) -> Self {
        Self::spanning(event, row, col, 1)
    }

    /// Creates a button covering `span` columns
    #[must_use]
    pub fn spanning(event: Event, row: usize, col: usize, span: usize) -> Self {
        Self {
            id: button_id(event),
            event,
            row,
            col,
            span: span.max(1),
        }
    }

    /// Text printed on the button
    #[must_use]
    pub fn label(&self) -> String {
        event_label(self.event)
    }

    fn covers(&self, row: usize, col: usize) -> bool {
        self.row == row && (self.col..self.col + self.span).contains(&col)
    }
}

fn button_id(event: Event) -> String {
    match event {
        Event::Digit(DigitToken::Digit(d)) => format!("btn-{d}"),
        Event::Digit(DigitToken::Decimal) => "btn-decimal".to_string(),
        Event::Action(action) => match action {
            Action::Add => "btn-add",
            Action::Subtract => "btn-subtract",
            Action::Multiply => "btn-multiply",
            Action::Divide => "btn-divide",
            Action::Clear => "btn-clear",
            Action::Delete => "btn-delete",
            Action::Percent => "btn-percent",
            Action::Equals => "btn-equals",
        }
        .to_string(),
        Event::Recall(_) => "btn-recall".to_string(),
    }
}

fn event_label(event: Event) -> String {
    match event {
        Event::Digit(token) => token.to_char().map(String::from).unwrap_or_default(),
        Event::Action(action) => match action {
            Action::Add => Operator::Add.symbol(),
            Action::Subtract => Operator::Subtract.symbol(),
            Action::Multiply => Operator::Multiply.symbol(),
            Action::Divide => Operator::Divide.symbol(),
            Action::Clear => "C",
            Action::Delete => "⌫",
            Action::Percent => "%",
            Action::Equals => "=",
        }
        .to_string(),
        Event::Recall(value) => crate::core::format_number(value),
    }
}

/// The calculator keypad
#[derive(Debug, Clone)]
pub struct Keypad {
    buttons: Vec<KeypadButton>,
    rows: usize,
    cols: usize,
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Keypad {
    /// Creates the standard layout
    #[must_use]
    pub fn new() -> Self {
        let digit = |d: u8| Event::Digit(DigitToken::Digit(d));
        let action = Event::Action;
        let op = |op: Operator| Event::Action(Action::from(op));

        let buttons = vec![
            // Row 0: C ⌫ % ÷
            KeypadButton::new(action(Action::Clear), 0, 0),
            KeypadButton::new(action(Action::Delete), 0, 1),
            KeypadButton::new(action(Action::Percent), 0, 2),
            KeypadButton::new(op(Operator::Divide), 0, 3),
            // Row 1: 7 8 9 ×
            KeypadButton::new(digit(7), 1, 0),
            KeypadButton::new(digit(8), 1, 1),
            KeypadButton::new(digit(9), 1, 2),
            KeypadButton::new(op(Operator::Multiply), 1, 3),
            // Row 2: 4 5 6 −
            KeypadButton::new(digit(4), 2, 0),
            KeypadButton::new(digit(5), 2, 1),
            KeypadButton::new(digit(6), 2, 2),
            KeypadButton::new(op(Operator::Subtract), 2, 3),
            // Row 3: 1 2 3 +
            KeypadButton::new(digit(1), 3, 0),
            KeypadButton::new(digit(2), 3, 1),
            KeypadButton::new(digit(3), 3, 2),
            KeypadButton::new(op(Operator::Add), 3, 3),
            // Row 4: 0 (wide) . =
            KeypadButton::spanning(digit(0), 4, 0, 2),
            KeypadButton::new(Event::Digit(DigitToken::Decimal), 4, 2),
            KeypadButton::new(action(Action::Equals), 4, 3),
        ];

        Self {
            buttons,
            rows: 5,
            cols: 4,
        }
    }

    /// Grid dimensions (rows, cols)
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// All buttons in row-major order
    #[must_use]
    pub fn buttons(&self) -> &[KeypadButton] {
        &self.buttons
    }

    /// Buttons in one row
    pub fn row(&self, row: usize) -> impl Iterator<Item = &KeypadButton> {
        self.buttons.iter().filter(move |b| b.row == row)
    }

    /// Button covering a grid cell
    #[must_use]
    pub fn button_at(&self, row: usize, col: usize) -> Option<&KeypadButton> {
        self.buttons.iter().find(|b| b.covers(row, col))
    }

    /// Button with the given element id
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&KeypadButton> {
        self.buttons.iter().find(|b| b.id == id)
    }

    /// Event for a click on element `id`
    #[must_use]
    pub fn handle_click(&self, id: &str) -> Option<Event> {
        self.find_by_id(id).map(|b| b.event)
    }

    /// Maps a keyboard key name to an event
    ///
    /// Names follow browser `KeyboardEvent.key` values.
    #[must_use]
    pub fn key_to_event(key: &str) -> Option<Event> {
        let event = match key {
            "+" => Event::Action(Action::Add),
            "-" => Event::Action(Action::Subtract),
            "*" => Event::Action(Action::Multiply),
            "/" => Event::Action(Action::Divide),
            "%" => Event::Action(Action::Percent),
            "Enter" | "=" => Event::Action(Action::Equals),
            "Backspace" => Event::Action(Action::Delete),
            "Escape" => Event::Action(Action::Clear),
            _ => {
                let mut chars = key.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                Event::Digit(DigitToken::from_char(c)?)
            }
        };
        Some(event)
    }
}
