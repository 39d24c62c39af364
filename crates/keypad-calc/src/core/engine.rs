//! Keypad state machine
//!
//! Turns digit, operator and control events into a running two-operand
//! expression. Chained operators evaluate left to right: `2 + 3 +` commits the
//! `+ 3` before the second `+` is accepted.

use tracing::{debug, warn};

use crate::core::display::Display;
use crate::core::operations::{format_number, parse_operand, round_result, Operator};
use crate::core::{EvalError, EvalResult};

/// Value shown when nothing has been typed
pub const ZERO: &str = "0";

const DECIMAL_POINT: char = '.';

/// The engine's single mutable record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorState {
    /// Operand being typed or the last computed result; never empty
    pub current_operand: String,
    /// Left-hand operand captured when an operator was chosen; empty when none
    pub pending_operand: String,
    /// Operator awaiting its right-hand operand
    pub pending_operator: Option<Operator>,
    /// Next digit starts a new operand instead of extending the current one
    pub awaiting_fresh_input: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            current_operand: ZERO.to_string(),
            pending_operand: String::new(),
            pending_operator: None,
            awaiting_fresh_input: false,
        }
    }
}

/// A digit key or the decimal point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitToken {
    /// One of 0-9
    Digit(u8),
    /// The decimal point
    Decimal,
}

impl DigitToken {
    /// Parses a keypad character
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            DECIMAL_POINT => Some(Self::Decimal),
            _ => c
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .map(Self::Digit),
        }
    }

    /// Returns the character appended to the operand, `None` for digits above 9
    #[must_use]
    pub fn to_char(self) -> Option<char> {
        match self {
            Self::Digit(d) => char::from_digit(u32::from(d), 10),
            Self::Decimal => Some(DECIMAL_POINT),
        }
    }
}

/// Operator selection and control actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Select addition
    Add,
    /// Select subtraction
    Subtract,
    /// Select multiplication
    Multiply,
    /// Select division
    Divide,
    /// Reset everything
    Clear,
    /// Remove the last typed character
    Delete,
    /// Divide the current operand by 100
    Percent,
    /// Commit the pending operation
    Equals,
}

impl Action {
    /// Returns the arithmetic operator this action selects, if any
    #[must_use]
    pub const fn operator(self) -> Option<Operator> {
        match self {
            Self::Add => Some(Operator::Add),
            Self::Subtract => Some(Operator::Subtract),
            Self::Multiply => Some(Operator::Multiply),
            Self::Divide => Some(Operator::Divide),
            Self::Clear | Self::Delete | Self::Percent | Self::Equals => None,
        }
    }
}

impl From<Operator> for Action {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Add => Self::Add,
            Operator::Subtract => Self::Subtract,
            Operator::Multiply => Self::Multiply,
            Operator::Divide => Self::Divide,
        }
    }
}

/// Input event consumed by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Digit or decimal point
    Digit(DigitToken),
    /// Operator or control action
    Action(Action),
    /// Load a previously committed result
    Recall(f64),
}

/// A successfully evaluated expression, ready for the history sink
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Expression text, e.g. `"2 + 3"`
    pub expression: String,
    /// Rounded result
    pub result: f64,
}

/// What a handler did
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use]
pub struct Effects {
    /// The display must be redrawn
    pub refresh: bool,
    /// A result was committed by `Equals`
    pub commit: Option<Commit>,
    /// Evaluation failed; its message is the user notice
    pub error: Option<EvalError>,
}

impl Effects {
    fn unchanged() -> Self {
        Self::default()
    }

    fn refreshed() -> Self {
        Self {
            refresh: true,
            ..Self::default()
        }
    }

    fn with_commit(mut self, commit: Commit) -> Self {
        self.commit = Some(commit);
        self
    }

    fn with_error(mut self, error: EvalError) -> Self {
        self.error = Some(error);
        self
    }

    /// True when nothing happened
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.refresh && self.commit.is_none() && self.error.is_none()
    }
}

/// Keypad calculator engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    state: CalculatorState,
}

impl Engine {
    /// Creates an engine in the default state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from an existing state
    #[must_use]
    pub fn with_state(state: CalculatorState) -> Self {
        Self { state }
    }

    /// Returns the current state
    #[must_use]
    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    /// Formats the current state for display
    #[must_use]
    pub fn display(&self) -> Display {
        Display::from_state(&self.state)
    }

    /// Dispatches an event to its handler
    pub fn apply(&mut self, event: Event) -> Effects {
        match event {
            Event::Digit(token) => self.input_digit(token),
            Event::Action(action) => self.input_operator(action),
            Event::Recall(value) => self.recall(value),
        }
    }

    /// Handles a digit or decimal point
    pub fn input_digit(&mut self, token: DigitToken) -> Effects {
        let Some(ch) = token.to_char() else {
            warn!(?token, "ignoring digit outside 0-9");
            return Effects::unchanged();
        };
        let state = &mut self.state;

        if state.awaiting_fresh_input {
            state.current_operand.clear();
            state.awaiting_fresh_input = false;
        }

        if token == DigitToken::Decimal && state.current_operand.contains(DECIMAL_POINT) {
            return Effects::unchanged();
        }

        if state.current_operand == ZERO && token != DigitToken::Decimal {
            state.current_operand = ch.to_string();
        } else {
            state.current_operand.push(ch);
        }
        Effects::refreshed()
    }

    /// Handles an operator or control action
    pub fn input_operator(&mut self, action: Action) -> Effects {
        match action {
            Action::Clear => {
                self.state = CalculatorState::default();
                Effects::refreshed()
            }
            Action::Delete => {
                let current = &mut self.state.current_operand;
                current.pop();
                if current.is_empty() || current == "-" {
                    *current = ZERO.to_string();
                }
                Effects::refreshed()
            }
            Action::Percent => match parse_operand(&self.state.current_operand) {
                Ok(value) => {
                    self.state.current_operand = format_number(value / 100.0);
                    Effects::refreshed()
                }
                Err(err) => {
                    warn!(%err, "percent ignored");
                    Effects::unchanged().with_error(err)
                }
            },
            Action::Equals => self.commit(),
            Action::Add | Action::Subtract | Action::Multiply | Action::Divide => {
                match action.operator() {
                    Some(op) => self.select_operator(op),
                    None => Effects::unchanged(),
                }
            }
        }
    }

    /// Evaluates `pending_operand <op> current_operand`
    ///
    /// On success the rounded result replaces the current operand. On failure
    /// nothing is mutated.
    pub fn evaluate(&mut self) -> EvalResult<f64> {
        let op = self
            .state
            .pending_operator
            .ok_or(EvalError::NoPendingOperation)?;
        let lhs = parse_operand(&self.state.pending_operand)?;
        let rhs = parse_operand(&self.state.current_operand)?;
        let result = round_result(op.apply(lhs, rhs)?);

        self.state.current_operand = format_number(result);
        debug!(lhs, rhs, op = op.name(), result, "evaluated");
        Ok(result)
    }

    /// Loads a previously committed result as the current operand
    ///
    /// The recalled value behaves like a fresh result: the next digit starts a
    /// new operand instead of extending it, and any pending operator is kept.
    pub fn recall(&mut self, value: f64) -> Effects {
        if !value.is_finite() {
            return Effects::unchanged().with_error(EvalError::InvalidOperand(value.to_string()));
        }
        self.state.current_operand = format_number(value);
        self.state.awaiting_fresh_input = true;
        Effects::refreshed()
    }

    fn commit(&mut self) -> Effects {
        let Some(op) = self.state.pending_operator else {
            return Effects::unchanged();
        };
        if self.state.pending_operand.is_empty() {
            return Effects::unchanged();
        }

        let expression = format!(
            "{} {} {}",
            self.state.pending_operand,
            op.symbol(),
            self.state.current_operand
        );
        match self.evaluate() {
            Ok(result) => {
                self.state.pending_operand.clear();
                self.state.pending_operator = None;
                self.state.awaiting_fresh_input = true;
                Effects::refreshed().with_commit(Commit { expression, result })
            }
            Err(err) => {
                warn!(%err, %expression, "evaluation rejected");
                Effects::unchanged().with_error(err)
            }
        }
    }

    fn select_operator(&mut self, op: Operator) -> Effects {
        let mut effects = Effects::refreshed();
        let state = &self.state;
        if state.pending_operator.is_some()
            && !state.pending_operand.is_empty()
            && !state.awaiting_fresh_input
        {
            if let Err(err) = self.evaluate() {
                warn!(%err, "chained evaluation rejected");
                effects = effects.with_error(err);
            }
        }

        self.state.pending_operand = self.state.current_operand.clone();
        self.state.pending_operator = Some(op);
        self.state.awaiting_fresh_input = true;
        effects
    }
}
