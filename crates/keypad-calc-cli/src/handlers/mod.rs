//! Command handlers
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod history;
pub mod keys;
pub mod run;

use std::sync::Arc;

use keypad_calc::history::{HistorySink, HistoryStore};
use keypad_calc::identity::{IdentityProvider, LocalIdentity, UserProfile};
use tracing::info;

use crate::config::CalcConfig;
use crate::error::CliResult;

pub use history::{execute_clear_history, execute_history};
pub use keys::execute_keys;
pub use run::execute_run;

/// Collaborators shared by every command
#[derive(Debug)]
pub struct AppContext {
    /// Resolved settings
    pub config: CalcConfig,
    /// Who is signed in
    pub identity: LocalIdentity,
    /// Calculation history
    pub store: HistoryStore,
}

impl AppContext {
    /// Opens the history store and signs in the configured user
    pub async fn open(config: CalcConfig) -> CliResult<Self> {
        config.validate()?;
        let store = match &config.history_file {
            Some(path) => HistoryStore::open(path, config.history_capacity).await?,
            None => HistoryStore::in_memory(config.history_capacity),
        };
        let identity = match config.profile() {
            Some(profile) => LocalIdentity::signed_in(profile),
            None => LocalIdentity::signed_out(),
        };
        info!(
            user = identity.current_user().as_ref().map(|u| u.uid.as_str()),
            history_file = ?config.history_file,
            "context ready"
        );
        Ok(Self {
            config,
            identity,
            store,
        })
    }

    /// The signed-in user
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.identity.current_user()
    }

    /// The store as a shareable sink
    #[must_use]
    pub fn sink(&self) -> Arc<dyn HistorySink> {
        Arc::new(self.store.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_signed_out() {
        let ctx = AppContext::open(CalcConfig::new()).await.unwrap();
        assert!(ctx.user().is_none());
        assert!(ctx.store.path().is_none());
        assert_eq!(ctx.store.capacity(), 100);
    }

    #[tokio::test]
    async fn test_open_with_file_and_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let config = CalcConfig::new().with_user("u1").with_history_file(&path);
        let ctx = AppContext::open(config).await.unwrap();
        assert_eq!(ctx.user().map(|u| u.uid), Some("u1".to_string()));
        assert_eq!(ctx.store.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_open_rejects_zero_capacity() {
        let mut config = CalcConfig::new();
        config.history_capacity = 0;
        assert!(AppContext::open(config).await.is_err());
    }
}
