//! Display formatting

use std::fmt;

use crate::core::engine::CalculatorState;

/// The two display lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Display {
    /// Current operand, verbatim
    pub primary: String,
    /// `"<pending operand> <symbol>"`, or empty when no operator is pending
    pub secondary: String,
}

impl Display {
    /// Derives the display from engine state
    #[must_use]
    pub fn from_state(state: &CalculatorState) -> Self {
        let secondary = state
            .pending_operator
            .map(|op| format!("{} {}", state.pending_operand, op.symbol()))
            .unwrap_or_default();
        Self {
            primary: state.current_operand.clone(),
            secondary,
        }
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secondary.is_empty() {
            write!(f, "{}", self.primary)
        } else {
            write!(f, "{}\n{}", self.secondary, self.primary)
        }
    }
}
