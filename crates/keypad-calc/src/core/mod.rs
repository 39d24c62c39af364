//! Calculator core: arithmetic, the keypad state machine, display formatting
//!
//! Nothing in here performs I/O. Handlers report what happened through
//! [`Effects`] and the session decides who hears about it.

pub mod display;
pub mod engine;
mod operations;

pub use display::Display;
pub use engine::{Action, CalculatorState, Commit, DigitToken, Effects, Engine, Event};
pub use operations::{
    format_number, parse_operand, round_result, Operator, RESULT_DECIMAL_PLACES,
};

use thiserror::Error;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Reasons an evaluation yields no value
///
/// The `Display` text of each variant is the notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An operand string is not a finite number
    #[error("Invalid number: {0:?}")]
    InvalidOperand(String),

    /// The divisor parsed to zero
    #[error("Cannot divide by zero")]
    DivisionByZero,

    /// The result is not finite
    #[error("Result is too large")]
    Overflow,

    /// No operator is pending
    #[error("No pending operation")]
    NoPendingOperation,
}
