//! Keys command handler

use std::sync::Arc;

use keypad_calc::core::Event;
use keypad_calc::notify::Notifier;
use keypad_calc::session::{spawn_recorder, Session};
use tracing::debug;

use super::AppContext;
use crate::commands::KeysArgs;
use crate::error::CliResult;
use crate::input::parse_script;
use crate::output::{ConsoleNotifier, ConsoleSurface};

/// Feeds a key script through a session and prints the final display
pub async fn execute_keys(ctx: &AppContext, args: &KeysArgs) -> CliResult<()> {
    let events = parse_script(&args.sequence)?;
    let notifier: Arc<dyn Notifier> =
        Arc::new(ConsoleNotifier::new(ctx.config.verbosity.is_quiet()));
    let surface = play(ctx, &events, notifier, ConsoleSurface::new(args.trace)).await?;
    surface.print_final()?;
    Ok(())
}

/// Runs `events` through a fresh session and waits until every commit is saved
pub async fn play(
    ctx: &AppContext,
    events: &[Event],
    notifier: Arc<dyn Notifier>,
    surface: ConsoleSurface,
) -> CliResult<ConsoleSurface> {
    let (recorder, task) = spawn_recorder(ctx.sink(), Arc::clone(&notifier));
    let mut session = Session::new(recorder, notifier, surface);
    session.set_user(ctx.user());

    for &event in events {
        let effects = session.handle(event);
        debug!(?event, noop = effects.is_noop(), "key handled");
    }

    let surface = session.into_surface();
    task.await?;
    Ok(surface)
}
