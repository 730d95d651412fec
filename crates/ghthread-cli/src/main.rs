// SPDX-License-Identifier: Apache-2.0

//! ghthread - render a GitHub issue or pull request as one markdown document.
//!
//! Everything GitHub knows about the thread (description, comments, reviews,
//! inline review comments, commits, timeline events, CI status and diff) is
//! printed to stdout in chronological order.

mod cli;
mod commands;
mod errors;
mod logging;
mod provider;

pub use provider::CliTokenProvider;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ghthread_core::config;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.quiet, cli.verbose);

    let output_ctx = OutputContext::from_cli(cli.quiet);

    let result = match config::load_config().context("Failed to load configuration") {
        Ok(config) => {
            debug!("Configuration loaded successfully");
            commands::run(cli.command, output_ctx, config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", errors::format_error(&e));
            ExitCode::FAILURE
        }
    }
}
