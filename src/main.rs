// Sealgate — Application Entry Point
//
// Parses CLI arguments, initializes structured logging (sealed material
// is only ever logged by size, never by content), and dispatches to the
// command handler. Everything runs synchronously on one control thread;
// the boundary crossing blocks until the trusted side returns.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sealgate::cli::{execute, Cli};

fn main() {
    // Initialize tracing with env filter (RUST_LOG=sealgate=debug for
    // verbose output). The default level is `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sealgate=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
