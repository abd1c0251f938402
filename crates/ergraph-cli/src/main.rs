//! ergraph CLI - Lay out entity-relationship diagrams and export them to draw.io

mod cli;

use clap::Parser;
use ergraph::core::logging::init_logging;

fn main() {
    let cli_args = cli::Cli::parse();

    // early logging; app.run() reinitializes with the CLI flags
    if let Err(e) = init_logging(None, None) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let mut app = cli::ErgraphApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
