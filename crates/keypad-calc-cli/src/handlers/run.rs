//! Run command handler: the interactive keypad
//!
//! Terminal input is read on the calling thread. The recorder and the history
//! feed run on the runtime's workers. Sign-ins and sign-outs arrive through the
//! identity subscription and re-target both the session and the feed.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use keypad_calc::core::Event;
use keypad_calc::history::HistorySink;
use keypad_calc::identity::{IdentityProvider, UserProfile};
use keypad_calc::notify::{Notifier, ToastBoard};
use keypad_calc::session::{clear_history, spawn_recorder, Session};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::info;

use super::history::SIGN_IN_FIRST;
use super::AppContext;
use crate::error::CliResult;
use crate::input::{map_key, Command};
use crate::screen::{HistoryFeed, RawModeGuard, Screen};

/// How often the screen is redrawn without input, so toasts expire
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Shown when Tab is pressed with an empty history
pub const NOTHING_TO_LOAD: &str = "No history to load";

/// Shown after signing out
pub const SIGNED_OUT: &str = "Signed out";

/// Shown when `s` is pressed with no user configured
pub const NO_PROFILE: &str = "No user configured; start with --user";

/// Opens the interactive keypad until the user quits
pub fn execute_run(ctx: &AppContext, runtime: &Runtime) -> CliResult<()> {
    let board = Arc::new(ToastBoard::new(ctx.config.toast_lifetime()));
    let notifier: Arc<dyn Notifier> = board.clone();
    let mut identity = ctx.identity.subscribe();
    let user = identity.borrow_and_update().clone();

    let (recorder, task, mut feed) = runtime.block_on(async {
        let (recorder, task) = spawn_recorder(ctx.sink(), Arc::clone(&notifier));
        let feed = HistoryFeed::watch(&ctx.store, user.as_ref());
        (recorder, task, feed)
    });
    let mut session = Session::new(recorder, notifier, Screen::new(user.as_ref()));
    session.set_user(user);

    let guard = RawModeGuard::enable()?;
    let result = event_loop(ctx, runtime, &mut identity, &mut session, &board, &mut feed);
    drop(guard);

    drop(session);
    drop(feed);
    runtime.block_on(task)?;
    info!("interactive session closed");
    result
}

fn event_loop(
    ctx: &AppContext,
    runtime: &Runtime,
    identity: &mut watch::Receiver<Option<UserProfile>>,
    session: &mut Session<Screen>,
    board: &ToastBoard,
    feed: &mut HistoryFeed,
) -> CliResult<()> {
    loop {
        {
            let _rt = runtime.enter();
            sync_identity(identity, session, feed, &ctx.store);
        }
        let toast = board.current();
        session
            .surface_mut()
            .draw(toast.as_deref(), &feed.records())?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match map_key(key) {
            Command::Quit => return Ok(()),
            Command::Key(event) => {
                let _ = session.handle(event);
            }
            Command::ToggleHistory => session.surface_mut().toggle_history(),
            Command::RecallLatest => recall_latest(session, board, feed),
            Command::ClearHistory => {
                let outcome = runtime.block_on(clear_history(&ctx.store, session.user(), board));
                info!(?outcome, "clear history requested");
            }
            Command::ToggleSignIn => toggle_sign_in(ctx, board),
            Command::None => {}
        }
    }
}

/// Applies a pending sign-in or sign-out; returns whether one was applied
///
/// Must be called inside a tokio runtime.
fn sync_identity(
    identity: &mut watch::Receiver<Option<UserProfile>>,
    session: &mut Session<Screen>,
    feed: &mut HistoryFeed,
    sink: &dyn HistorySink,
) -> bool {
    if !identity.has_changed().unwrap_or(false) {
        return false;
    }
    let user = identity.borrow_and_update().clone();
    info!(uid = user.as_ref().map(|u| u.uid.as_str()), "identity changed");
    *feed = HistoryFeed::watch(sink, user.as_ref());
    session.surface_mut().set_user(user.as_ref());
    session.set_user(user);
    true
}

fn toggle_sign_in(ctx: &AppContext, board: &ToastBoard) {
    if ctx.identity.current_user().is_some() {
        ctx.identity.sign_out();
        board.notify(SIGNED_OUT);
        return;
    }
    match ctx.config.profile() {
        Some(profile) => {
            board.notify(&format!("Signed in as {}", profile.label()));
            ctx.identity.sign_in(profile);
        }
        None => board.notify(NO_PROFILE),
    }
}

fn recall_latest(session: &mut Session<Screen>, board: &ToastBoard, feed: &HistoryFeed) {
    if session.user().is_none() {
        board.notify(SIGN_IN_FIRST);
        return;
    }
    match feed.latest() {
        Some(record) => {
            let _ = session.handle(Event::Recall(record.result));
        }
        None => board.notify(NOTHING_TO_LOAD),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::CalcConfig;
    use keypad_calc::history::HistorySink;
    use keypad_calc::session::RESULT_LOADED;

    fn session_for(ctx: &AppContext, board: &Arc<ToastBoard>) -> Session<Screen> {
        let (recorder, _task) = spawn_recorder(ctx.sink(), board.clone());
        let user = ctx.user();
        let mut session = Session::new(recorder, board.clone(), Screen::new(user.as_ref()));
        session.set_user(user);
        session
    }

    async fn wait_for_records(feed: &HistoryFeed) {
        for _ in 0..50 {
            if feed.latest().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_recall_latest_loads_newest_result() {
        let ctx = AppContext::open(CalcConfig::new().with_user("u1"))
            .await
            .unwrap();
        ctx.store.record("u1", "1 + 1", 2.0).await.unwrap();
        ctx.store.record("u1", "6 × 7", 42.0).await.unwrap();
        let feed = HistoryFeed::watch(&ctx.store, ctx.user().as_ref());
        wait_for_records(&feed).await;

        let board = Arc::new(ToastBoard::default());
        let mut session = session_for(&ctx, &board);
        recall_latest(&mut session, &board, &feed);

        assert_eq!(session.engine().state().current_operand, "42");
        assert_eq!(board.current().as_deref(), Some(RESULT_LOADED));
    }

    #[tokio::test]
    async fn test_recall_latest_empty_history() {
        let ctx = AppContext::open(CalcConfig::new().with_user("u1"))
            .await
            .unwrap();
        let feed = HistoryFeed::watch(&ctx.store, ctx.user().as_ref());
        let board = Arc::new(ToastBoard::default());
        let mut session = session_for(&ctx, &board);
        recall_latest(&mut session, &board, &feed);

        assert_eq!(session.engine().state().current_operand, "0");
        assert_eq!(board.current().as_deref(), Some(NOTHING_TO_LOAD));
    }

    #[tokio::test]
    async fn test_identity_change_retargets_session_and_feed() {
        let ctx = AppContext::open(CalcConfig::new().with_user("u1"))
            .await
            .unwrap();
        ctx.store.record("u1", "1 + 1", 2.0).await.unwrap();
        ctx.store.record("u2", "3 × 3", 9.0).await.unwrap();

        let mut identity = ctx.identity.subscribe();
        let mut feed = HistoryFeed::watch(&ctx.store, ctx.user().as_ref());
        let board = Arc::new(ToastBoard::default());
        let mut session = session_for(&ctx, &board);
        assert!(!sync_identity(&mut identity, &mut session, &mut feed, &ctx.store));

        ctx.identity.sign_in(UserProfile::new("u2"));
        assert!(sync_identity(&mut identity, &mut session, &mut feed, &ctx.store));
        wait_for_records(&feed).await;
        assert_eq!(session.user().map(|u| u.uid.as_str()), Some("u2"));
        assert_eq!(feed.latest().map(|r| r.result), Some(9.0));

        ctx.identity.sign_out();
        assert!(sync_identity(&mut identity, &mut session, &mut feed, &ctx.store));
        assert!(session.user().is_none());
        assert!(feed.records().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_session_stops_recording() {
        let ctx = AppContext::open(CalcConfig::new().with_user("u1"))
            .await
            .unwrap();
        let mut identity = ctx.identity.subscribe();
        let mut feed = HistoryFeed::watch(&ctx.store, ctx.user().as_ref());
        let board = Arc::new(ToastBoard::default());
        let (recorder, task) = spawn_recorder(ctx.sink(), board.clone());
        let mut session = Session::new(recorder, board.clone(), Screen::new(ctx.user().as_ref()));
        session.set_user(ctx.user());

        ctx.identity.sign_out();
        sync_identity(&mut identity, &mut session, &mut feed, &ctx.store);
        for event in crate::input::parse_script("2+2=").unwrap() {
            let _ = session.handle(event);
        }
        drop(session);
        task.await.unwrap();
        assert!(ctx.store.snapshot("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_sign_in_round_trip() {
        let ctx = AppContext::open(CalcConfig::new().with_user("u1"))
            .await
            .unwrap();
        let board = ToastBoard::default();

        toggle_sign_in(&ctx, &board);
        assert!(ctx.user().is_none());
        assert_eq!(board.current().as_deref(), Some(SIGNED_OUT));

        toggle_sign_in(&ctx, &board);
        assert_eq!(ctx.user().map(|u| u.uid), Some("u1".to_string()));
        assert_eq!(board.current().as_deref(), Some("Signed in as u1"));
    }

    #[tokio::test]
    async fn test_toggle_sign_in_without_profile() {
        let ctx = AppContext::open(CalcConfig::new()).await.unwrap();
        let board = ToastBoard::default();
        toggle_sign_in(&ctx, &board);
        assert!(ctx.user().is_none());
        assert_eq!(board.current().as_deref(), Some(NO_PROFILE));
    }

    #[tokio::test]
    async fn test_recall_latest_signed_out() {
        let ctx = AppContext::open(CalcConfig::new()).await.unwrap();
        let feed = HistoryFeed::watch(&ctx.store, None);
        let board = Arc::new(ToastBoard::default());
        let mut session = session_for(&ctx, &board);
        recall_latest(&mut session, &board, &feed);

        assert_eq!(board.current().as_deref(), Some(SIGN_IN_FIRST));
    }
}
