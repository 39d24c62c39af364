//! The input-processing actor
//!
//! A [`Session`] owns the engine for its whole lifetime and handles events one
//! at a time. Committed results leave through a [`RecorderHandle`]: the send is
//! synchronous and never blocks, and a background task writes them to the
//! history sink. Whatever the sink does afterwards never touches the engine.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::core::{Commit, Display, Effects, Engine, Event};
use crate::history::HistorySink;
use crate::identity::UserProfile;
use crate::notify::Notifier;

/// Notice raised when a history write fails
pub const SAVE_FAILED: &str = "Failed to save calculation";

/// Notice raised after a history result is loaded
pub const RESULT_LOADED: &str = "Result loaded";

/// Receives the display after every refresh
pub trait DisplaySurface {
    /// Draws `display`
    fn render(&mut self, display: &Display);
}

/// Keeps every rendered display (for tests and scripted runs)
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    frames: Vec<Display>,
}

impl RecordingSurface {
    /// Creates an empty surface
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rendered frames, oldest first
    #[must_use]
    pub fn frames(&self) -> &[Display] {
        &self.frames
    }

    /// The last rendered frame
    #[must_use]
    pub fn last(&self) -> Option<&Display> {
        self.frames.last()
    }
}

impl DisplaySurface for RecordingSurface {
    fn render(&mut self, display: &Display) {
        self.frames.push(display.clone());
    }
}

#[derive(Debug)]
struct PendingRecord {
    user_id: String,
    commit: Commit,
}

/// Sending half of the recorder queue
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    tx: mpsc::UnboundedSender<PendingRecord>,
}

impl RecorderHandle {
    /// Queues a commit for `user_id`; returns false if the recorder is gone
    pub fn submit(&self, user_id: &str, commit: Commit) -> bool {
        let record = PendingRecord {
            user_id: user_id.to_string(),
            commit,
        };
        if self.tx.send(record).is_err() {
            warn!(user_id, "history recorder stopped; calculation not saved");
            return false;
        }
        true
    }
}

/// Spawns the task that forwards commits to `sink`
///
/// The task drains the queue and exits once every [`RecorderHandle`] is
/// dropped. Must be called inside a tokio runtime.
pub fn spawn_recorder(
    sink: Arc<dyn HistorySink>,
    notifier: Arc<dyn Notifier>,
) -> (RecorderHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_recorder(rx, sink, notifier));
    (RecorderHandle { tx }, task)
}

async fn run_recorder(
    mut rx: mpsc::UnboundedReceiver<PendingRecord>,
    sink: Arc<dyn HistorySink>,
    notifier: Arc<dyn Notifier>,
) {
    while let Some(PendingRecord { user_id, commit }) = rx.recv().await {
        if let Err(err) = sink
            .record(&user_id, &commit.expression, commit.result)
            .await
        {
            error!(%err, user_id, expression = %commit.expression, "error saving calculation");
            notifier.notify(SAVE_FAILED);
        }
    }
    debug!("history recorder finished");
}

/// Single owner of the calculator engine
pub struct Session<S: DisplaySurface> {
    engine: Engine,
    user: Option<UserProfile>,
    recorder: RecorderHandle,
    notifier: Arc<dyn Notifier>,
    surface: S,
}

impl<S: DisplaySurface> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl<S: DisplaySurface> Session<S> {
    /// Creates a session and draws the initial display
    pub fn new(recorder: RecorderHandle, notifier: Arc<dyn Notifier>, mut surface: S) -> Self {
        let engine = Engine::new();
        surface.render(&engine.display());
        Self {
            engine,
            user: None,
            recorder,
            notifier,
            surface,
        }
    }

    /// Sets the signed-in user; commits are only recorded while one is set
    pub fn set_user(&mut self, user: Option<UserProfile>) {
        self.user = user;
    }

    /// The signed-in user
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// The engine
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The display surface
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the display surface
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Redraws the current display
    pub fn refresh(&mut self) {
        self.surface.render(&self.engine.display());
    }

    /// Handles one input event
    pub fn handle(&mut self, event: Event) -> Effects {
        let effects = self.engine.apply(event);

        if let Some(commit) = &effects.commit {
            match &self.user {
                Some(user) => {
                    self.recorder.submit(&user.uid, commit.clone());
                }
                None => debug!(expression = %commit.expression, "not signed in; result not saved"),
            }
        }
        if let Some(err) = &effects.error {
            self.notifier.notify(&err.to_string());
        }
        if effects.refresh {
            self.refresh();
            if matches!(event, Event::Recall(_)) {
                self.notifier.notify(RESULT_LOADED);
            }
        }
        effects
    }

    /// Consumes the session, returning the surface
    ///
    /// Dropping the session's recorder handle lets the recorder task finish.
    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// Outcome of [`clear_history`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Nobody is signed in
    NotSignedIn,
    /// There was nothing to delete
    Empty,
    /// This many records were deleted
    Cleared(usize),
    /// The sink reported an error
    Failed,
}

impl ClearOutcome {
    /// Notice shown for this outcome
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotSignedIn => "Please sign in first",
            Self::Empty => "No history to clear",
            Self::Cleared(_) => "History cleared successfully!",
            Self::Failed => "Failed to clear history",
        }
    }
}

/// Deletes the user's history and reports the outcome through `notifier`
pub async fn clear_history(
    sink: &dyn HistorySink,
    user: Option<&UserProfile>,
    notifier: &dyn Notifier,
) -> ClearOutcome {
    let outcome = match user {
        None => ClearOutcome::NotSignedIn,
        Some(user) => {
            notifier.notify("Clearing history...");
            match sink.clear_all(&user.uid).await {
                Ok(0) => ClearOutcome::Empty,
                Ok(removed) => ClearOutcome::Cleared(removed),
                Err(err) => {
                    error!(%err, uid = %user.uid, "error clearing history");
                    ClearOutcome::Failed
                }
            }
        }
    };
    notifier.notify(outcome.message());
    outcome
}
