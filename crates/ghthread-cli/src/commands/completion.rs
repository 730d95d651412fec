// SPDX-License-Identifier: Apache-2.0

//! Shell completion generation.

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use tracing::debug;

use crate::cli::Cli;

/// Writes a completion script for `shell` to stdout.
pub fn run_generate(shell: Shell) -> Result<()> {
    debug!(?shell, "Generating completion script");
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
