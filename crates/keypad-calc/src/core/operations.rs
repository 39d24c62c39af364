//! Binary arithmetic for the keypad engine
//!
//! Operands travel through the engine as decimal strings. This module owns the
//! conversions in both directions and the 9-decimal rounding applied to every
//! committed result.

use crate::core::{EvalError, EvalResult};

/// Number of decimal places kept in a committed result
pub const RESULT_DECIMAL_PLACES: i32 = 9;

const RESULT_SCALE: f64 = 1_000_000_000.0;

/// Arithmetic operator selectable on the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Addition (+)
    Add,
    /// Subtraction (−)
    Subtract,
    /// Multiplication (×)
    Multiply,
    /// Division (÷)
    Divide,
}

impl Operator {
    /// All operators in keypad order
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// Returns the glyph shown on the display and in history expressions
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "−",
            Self::Multiply => "×",
            Self::Divide => "÷",
        }
    }

    /// Returns the lowercase name used for element ids and logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    /// Applies the operator to two operands
    ///
    /// Division by zero and non-finite results are reported as errors; the
    /// result is not rounded here.
    pub fn apply(self, lhs: f64, rhs: f64) -> EvalResult<f64> {
        let raw = match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                lhs / rhs
            }
        };
        check_finite(raw)
    }
}

fn check_finite(value: f64) -> EvalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::Overflow)
    }
}

/// Parses an operand string into a finite number
///
/// Accepts the partial forms the keypad can produce (`"5."`, `".5"`); a lone
/// `"."` or `"-"` is rejected.
pub fn parse_operand(text: &str) -> EvalResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| EvalError::InvalidOperand(text.to_string()))
}

/// Rounds to [`RESULT_DECIMAL_PLACES`], ties toward positive infinity
///
/// `0.1 + 0.2` becomes exactly the double nearest `0.3`.
#[must_use]
pub fn round_result(value: f64) -> f64 {
    let scaled = value * RESULT_SCALE;
    if !scaled.is_finite() {
        // Too large to carry a fractional part anyway.
        return value;
    }
    let floor = scaled.floor();
    let rounded = if scaled - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    };
    rounded / RESULT_SCALE
}

/// Formats a number as a canonical decimal operand string
///
/// Shortest representation that parses back to the same value, never in
/// exponent form, and without a sign on zero.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}
