use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rom_ident::cli::{self, ExitStatus};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("rom_ident=debug,info")
    } else {
        EnvFilter::new("rom_ident=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli::run(cli) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitStatus::FatalError.into()
        }
    }
}
