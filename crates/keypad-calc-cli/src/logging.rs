//! Tracing subscriber setup
//!
//! Logs always go to stderr so they never mix with display output on stdout.

use tracing_subscriber::EnvFilter;

use crate::config::Verbosity;

/// Filter from `RUST_LOG`, else from the verbosity level
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()))
}

/// Installs the global subscriber; later calls are no-ops
pub fn init(verbosity: Verbosity, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init(Verbosity::Quiet, false);
        init(Verbosity::Debug, true);
    }
}
