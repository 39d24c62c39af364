//! Transient user notices

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::info;

/// Receives short user-visible messages
pub trait Notifier: Send + Sync {
    /// Shows `message`; fire-and-forget
    fn notify(&self, message: &str);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(notice = message, "notice");
    }
}

/// A notice with the moment it was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Message text
    pub message: String,
    /// When it was raised
    pub raised_at: Instant,
}

/// Holds the latest notice until it expires
///
/// A new notice replaces the one on screen.
#[derive(Debug)]
pub struct ToastBoard {
    current: Mutex<Option<Toast>>,
    lifetime: Duration,
}

impl Default for ToastBoard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIFETIME)
    }
}

impl ToastBoard {
    /// How long a toast stays visible
    pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(3000);

    /// Creates a board with a custom lifetime
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            lifetime,
        }
    }

    /// Toast lifetime
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Message visible right now
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.current_at(Instant::now())
    }

    /// Message visible at `now`
    #[must_use]
    pub fn current_at(&self, now: Instant) -> Option<String> {
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(toast) if now.saturating_duration_since(toast.raised_at) < self.lifetime => {
                Some(toast.message.clone())
            }
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Raises a toast at a specific instant
    pub fn raise_at(&self, message: &str, raised_at: Instant) {
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Toast {
            message: message.to_string(),
            raised_at,
        });
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, message: &str) {
        info!(notice = message, "toast");
        self.raise_at(message, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_board_empty() {
        let board = ToastBoard::default();
        assert_eq!(board.lifetime(), ToastBoard::DEFAULT_LIFETIME);
        assert!(board.current().is_none());
    }

    #[test]
    fn test_toast_board_shows_latest() {
        let board = ToastBoard::default();
        board.notify("first");
        board.notify("Cannot divide by zero");
        assert_eq!(board.current().as_deref(), Some("Cannot divide by zero"));
    }

    #[test]
    fn test_toast_board_expires() {
        let board = ToastBoard::new(Duration::from_millis(100));
        let start = Instant::now();
        board.raise_at("Result loaded", start);
        assert!(board.current_at(start + Duration::from_millis(50)).is_some());
        assert!(board.current_at(start + Duration::from_millis(100)).is_none());
        // Expired toasts are dropped for good.
        assert!(board.current_at(start).is_none());
    }

    #[test]
    fn test_log_notifier_does_not_panic() {
        LogNotifier.notify("Signed out successfully");
    }
}
