//! Keypad Calc CLI Library
//!
//! Terminal front end for the keypad calculator: argument parsing, layered
//! configuration, key mapping, and the handlers behind each subcommand.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod input;
pub mod logging;
pub mod output;
pub mod screen;

pub use commands::{Cli, ColorArg, Commands, HistoryArgs, KeysArgs};
pub use config::{CalcConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use handlers::AppContext;
