//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Keypad calculator for the terminal
#[derive(Parser, Debug)]
#[command(name = "keypad-calc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress notices)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML config file supplying defaults
    #[arg(long, global = true, env = "KEYPAD_CALC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sign in as this user id
    #[arg(long, global = true, env = "KEYPAD_CALC_USER")]
    pub user: Option<String>,

    /// Display name for the signed-in user
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Stay signed out, even if the config names a user
    #[arg(long, global = true, conflicts_with = "user")]
    pub guest: bool,

    /// JSON file holding calculation history
    #[arg(long, global = true, env = "KEYPAD_CALC_HISTORY")]
    pub history_file: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive keypad
    ///
    /// Keys: 0-9 . + - * / % Enter = Backspace Escape.
    /// h toggles history, Tab loads the newest result, x clears history,
    /// q or Ctrl+C quits.
    Run,

    /// Feed a key sequence and print the resulting display
    ///
    /// Each character is one key: digits, '.', + - * / %, '=' evaluates,
    /// 'c' clears, '<' deletes. Whitespace is ignored.
    Keys(KeysArgs),

    /// List the signed-in user's calculations, newest first
    History(HistoryArgs),

    /// Delete the signed-in user's calculations
    ClearHistory,
}

/// Arguments for the keys command
#[derive(Parser, Debug)]
pub struct KeysArgs {
    /// Key sequence, e.g. "12+30="
    #[arg(allow_hyphen_values = true)]
    pub sequence: String,

    /// Print the display after every refresh
    #[arg(long)]
    pub trace: bool,
}

/// Arguments for the history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
