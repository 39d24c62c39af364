//! History and clear-history command handlers

use keypad_calc::history::HistoryRecord;
use keypad_calc::notify::LogNotifier;
use keypad_calc::session::{clear_history, ClearOutcome};

use super::AppContext;
use crate::commands::HistoryArgs;
use crate::error::{CliError, CliResult};
use crate::output::{history_line, NO_CALCULATIONS};

/// Shown when a history command runs signed out
pub const SIGN_IN_FIRST: &str = "Please sign in first";

/// Lists the signed-in user's history, newest first
pub async fn execute_history(ctx: &AppContext, args: &HistoryArgs) -> CliResult<()> {
    let Some(user) = ctx.user() else {
        eprintln!("{SIGN_IN_FIRST}");
        return Ok(());
    };
    let records = limit(ctx.store.snapshot(&user.uid).await, args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for line in render_history(&records) {
        println!("{line}");
    }
    Ok(())
}

/// Deletes the signed-in user's history and prints the outcome
pub async fn execute_clear_history(ctx: &AppContext) -> CliResult<()> {
    let user = ctx.user();
    let outcome = clear_history(&ctx.store, user.as_ref(), &LogNotifier).await;
    match outcome {
        ClearOutcome::Failed => Err(CliError::command(outcome.message())),
        _ => {
            println!("{}", outcome.message());
            Ok(())
        }
    }
}

/// Keeps the first `limit` records
#[must_use]
pub fn limit(mut records: Vec<HistoryRecord>, limit: Option<usize>) -> Vec<HistoryRecord> {
    if let Some(n) = limit {
        records.truncate(n);
    }
    records
}

/// History lines, or the empty-history prompt
#[must_use]
pub fn render_history(records: &[HistoryRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec![NO_CALCULATIONS.to_string()];
    }
    records.iter().map(history_line).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::CalcConfig;
    use keypad_calc::history::HistorySink;

    fn records(n: usize) -> Vec<HistoryRecord> {
        (0..n)
            .map(|i| HistoryRecord::with_timestamp(format!("{i} + 0"), i as f64, None))
            .collect()
    }

    #[test]
    fn test_limit() {
        assert_eq!(limit(records(5), Some(2)).len(), 2);
        assert_eq!(limit(records(5), None).len(), 5);
        assert_eq!(limit(records(1), Some(3)).len(), 1);
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), vec![NO_CALCULATIONS.to_string()]);
    }

    #[test]
    fn test_render_history_lines() {
        console::set_colors_enabled(false);
        let lines = render_history(&records(2));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1 + 0  = 1"));
    }

    #[tokio::test]
    async fn test_clear_history_signed_in() {
        let ctx = AppContext::open(CalcConfig::new().with_user("u1"))
            .await
            .unwrap();
        ctx.store.record("u1", "1 + 1", 2.0).await.unwrap();
        execute_clear_history(&ctx).await.unwrap();
        assert!(ctx.store.snapshot("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_history_signed_out_succeeds() {
        let ctx = AppContext::open(CalcConfig::new()).await.unwrap();
        assert!(execute_clear_history(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_history_signed_out_succeeds() {
        let ctx = AppContext::open(CalcConfig::new()).await.unwrap();
        let args = HistoryArgs {
            limit: None,
            json: false,
        };
        assert!(execute_history(&ctx, &args).await.is_ok());
    }
}
