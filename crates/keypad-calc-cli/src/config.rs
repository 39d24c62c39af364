//! CLI configuration
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional YAML file, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keypad_calc::history::HistoryStore;
use keypad_calc::identity::UserProfile;
use keypad_calc::notify::ToastBoard;
use serde::{Deserialize, Serialize};

use crate::commands::Cli;
use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Quiet - no notices, no logs
    Quiet,
    /// Normal - notices and errors
    #[default]
    Normal,
    /// Verbose - informational logs
    Verbose,
    /// Debug - state transitions
    Debug,
}

impl Verbosity {
    /// Level derived from `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter for this level
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "off",
            Self::Normal => "error",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Automatic detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Applies the choice to stdout and stderr styling
    pub fn apply(self) {
        let enabled = match self {
            Self::Auto => return,
            Self::Always => true,
            Self::Never => false,
        };
        console::set_colors_enabled(enabled);
        console::set_colors_enabled_stderr(enabled);
    }
}

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConfig {
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Color output
    pub color: ColorChoice,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Signed-in user id; `None` means signed out
    pub user: Option<String>,
    /// Display name for the user
    pub display_name: Option<String>,
    /// Email for the user
    pub email: Option<String>,
    /// History file; `None` keeps history in memory
    pub history_file: Option<PathBuf>,
    /// Records kept per user
    pub history_capacity: usize,
    /// How long a notice stays on screen
    pub toast_lifetime_ms: u64,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            log_json: false,
            user: None,
            display_name: None,
            email: None,
            history_file: None,
            history_capacity: HistoryStore::DEFAULT_CAPACITY,
            toast_lifetime_ms: ToastBoard::DEFAULT_LIFETIME.as_millis() as u64,
        }
    }
}

impl CalcConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> CliResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML config file
    pub fn from_yaml_file(path: &Path) -> CliResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|err| {
            CliError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Builds the configuration for `cli`: file defaults, then flags
    pub fn resolve(cli: &Cli) -> CliResult<Self> {
        let base = match &cli.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_cli_overrides(cli))
    }

    /// Applies flags given on the command line
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if cli.quiet || cli.verbose > 0 {
            self.verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
        }
        if cli.color != crate::commands::ColorArg::Auto {
            self.color = cli.color.into();
        }
        self.log_json |= cli.log_json;
        if cli.guest {
            self.user = None;
        } else if let Some(user) = &cli.user {
            self.user = Some(user.clone());
        }
        if let Some(name) = &cli.name {
            self.display_name = Some(name.clone());
        }
        if let Some(path) = &cli.history_file {
            self.history_file = Some(path.clone());
        }
        self
    }

    /// Set the signed-in user
    #[must_use]
    pub fn with_user(mut self, uid: impl Into<String>) -> Self {
        self.user = Some(uid.into());
        self
    }

    /// Set the history file
    #[must_use]
    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Rejects settings the store cannot honour
    pub fn validate(&self) -> CliResult<()> {
        if self.history_capacity == 0 {
            return Err(CliError::config("history_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Profile of the signed-in user, if any
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        let uid = self.user.as_deref().filter(|uid| !uid.trim().is_empty())?;
        let mut profile = UserProfile::new(uid.trim());
        if let Some(name) = &self.display_name {
            profile = profile.with_display_name(name.clone());
        }
        if let Some(email) = &self.email {
            profile = profile.with_email(email.clone());
        }
        Some(profile)
    }

    /// Notice lifetime as a duration
    #[must_use]
    pub const fn toast_lifetime(&self) -> Duration {
        Duration::from_millis(self.toast_lifetime_ms)
    }
}
