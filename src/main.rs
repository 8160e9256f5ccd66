//! Relay - tool-using agent runtime
//!
//! Main entry point for the CLI application.

use std::process::ExitCode;

use clap::Parser;
use relay::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    cli::init_tracing(args.debug);
    cli::run(args).await
}
