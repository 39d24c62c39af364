//! Keypad Calculator
//!
//! A two-operand calculator driven by discrete keypad events, with per-user
//! calculation history.
//!
//! - [`core`]: the state machine, arithmetic and display formatting. Pure, no I/O.
//! - [`session`]: the actor that owns the engine and forwards committed results.
//! - [`history`], [`identity`], [`notify`]: the collaborators a session talks to.
//! - [`keypad`]: key names and the button grid.
//!
//! # Example
//!
//! ```rust
//! use keypad_calc::prelude::*;
//!
//! let mut engine = Engine::new();
//! for key in ["0", ".", "1", "+", "0", ".", "2", "="] {
//!     let event = Keypad::key_to_event(key).unwrap();
//!     let _ = engine.apply(event);
//! }
//! assert_eq!(engine.display().primary, "0.3");
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::float_cmp
    )
)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

pub mod core;
pub mod history;
pub mod identity;
pub mod keypad;
pub mod notify;
pub mod session;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{
        Action, CalculatorState, Commit, DigitToken, Display, Effects, Engine, EvalError,
        EvalResult, Event, Operator,
    };
    pub use crate::history::{HistoryError, HistoryRecord, HistorySink, HistoryStore};
    pub use crate::identity::{IdentityProvider, LocalIdentity, UserProfile};
    pub use crate::keypad::{Keypad, KeypadButton};
    pub use crate::notify::{LogNotifier, Notifier, ToastBoard};
    pub use crate::session::{
        clear_history, spawn_recorder, ClearOutcome, DisplaySurface, RecorderHandle,
        RecordingSurface, Session,
    };
}
