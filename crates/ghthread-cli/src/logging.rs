// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the ghthread CLI.
//!
//! Uses `tracing` with `tracing-subscriber`, always writing to stderr so the
//! document on stdout stays clean. `RUST_LOG` overrides the defaults.
//!
//! # Examples
//!
//! ```bash
//! # Debug output for troubleshooting
//! RUST_LOG=ghthread=debug ghthread dump owner/repo#1
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directives used when `RUST_LOG` is unset.
fn default_filter(quiet: bool, verbose: bool) -> &'static str {
    if verbose {
        "ghthread=debug,octocrab=warn,reqwest=warn"
    } else if quiet {
        "ghthread=error,octocrab=error,reqwest=error"
    } else {
        "ghthread=warn,octocrab=error,reqwest=error"
    }
}

/// Initialize the logging subsystem.
///
/// `-v` raises ghthread's own logs to debug; `-q` lowers them to errors.
pub fn init_logging(quiet: bool, verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(quiet, verbose)))
        .expect("valid default filter directives");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
