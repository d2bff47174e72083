//! Main entry point for keygate
//!
//! - CLI mode: any command-line argument (`keygate check`, `keygate config show`, ...)
//! - GUI mode: no arguments; opens the key dialog window

use anyhow::Result;
use keygate_core::{LoggingDestination, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli_mode = keygate_cli::should_run_cli_mode();
    let destination = if cli_mode {
        LoggingDestination::FileAndStderr
    } else {
        LoggingDestination::FileOnly
    };
    if let Err(err) = init_logging(destination) {
        eprintln!("Failed to initialize logging: {err}");
    }

    if cli_mode {
        if let Err(e) = keygate_cli::run().await {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    } else if let Err(e) = keygate_gui::run() {
        eprintln!("GUI error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
