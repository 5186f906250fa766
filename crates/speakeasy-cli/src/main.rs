//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use speakeasy_cli::{Cli, CliError, bootstrap, headless, tui};

fn main() -> ExitCode {
    // Load .env before parsing so env-backed flags see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let ctx = bootstrap(cli)?;
    match &cli.test {
        Some(text) => headless::run(ctx, text, &cli.out).map(|_| ()),
        None => tui::run(ctx, &cli.out),
    }
}

/// Diagnostics go to stderr. The interactive front-end stays quiet unless
/// asked, so log output does not tear the status line.
fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "info"
    } else if cli.is_headless() {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

