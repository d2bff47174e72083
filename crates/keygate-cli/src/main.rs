use keygate_core::{LoggingDestination, init_logging};

#[tokio::main]
async fn main() {
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Failed to initialize logging: {err}");
    }

    if let Err(err) = keygate_cli::run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
