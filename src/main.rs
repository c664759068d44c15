//! querynote command-line entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use querynote::cli::{Cli, execute};

fn main() -> ExitCode {
    // Settings usually live in a `.env` file. Real environment variables
    // win, and clap's `env` fallbacks see both.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the conversation and, for
    // serve-workspace, the MCP protocol.
    let default_filter = if cli.verbose {
        "querynote=debug"
    } else {
        "querynote=info"
    };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    match execute(&cli) {
        Ok(output) => {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(output.as_bytes());
            let _ = stdout.flush();
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Error: {e}");
            ExitCode::FAILURE
        }
    }
}
