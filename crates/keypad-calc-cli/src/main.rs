//! Keypad Calc: a keypad calculator in the terminal
//!
//! ## Usage
//!
//! ```bash
//! keypad-calc run --user ada               # Interactive keypad
//! keypad-calc keys "12+30="                # Scripted keys, prints 42
//! keypad-calc --history-file h.json --user ada history
//! keypad-calc --history-file h.json --user ada clear-history
//! ```

use clap::Parser;
use keypad_calc_cli::{handlers, logging, AppContext, CalcConfig, Cli, CliResult, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from the config file and CLI args
    let config = CalcConfig::resolve(&cli)?;
    logging::init(config.verbosity, config.log_json);
    config.color.apply();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let ctx = runtime.block_on(AppContext::open(config))?;

    match cli.command {
        Commands::Run => handlers::execute_run(&ctx, &runtime),
        Commands::Keys(args) => runtime.block_on(handlers::execute_keys(&ctx, &args)),
        Commands::History(args) => runtime.block_on(handlers::execute_history(&ctx, &args)),
        Commands::ClearHistory => runtime.block_on(handlers::execute_clear_history(&ctx)),
    }
}
