// SPDX-License-Identifier: Apache-2.0

//! Dump command: render one issue or pull request to stdout.

use std::io::Write;

use anyhow::{Context, Result};
use ghthread_core::{AppConfig, dump_thread};
use tracing::debug;

use crate::provider::CliTokenProvider;

/// Applies command-line flags on top of the loaded configuration.
pub fn apply_overrides(
    config: &mut AppConfig,
    diff_threshold: Option<u64>,
    utc: bool,
    no_images: bool,
) {
    if let Some(threshold) = diff_threshold {
        debug!(threshold, "Overriding diff threshold");
        config.render.diff_threshold = threshold;
    }
    if utc {
        config.render.utc = true;
    }
    if no_images {
        config.fetch.images = false;
    }
}

/// Fetches and renders the thread.
pub async fn run(reference: &str, repo: Option<&str>, config: &AppConfig) -> Result<String> {
    let document = dump_thread(&CliTokenProvider, reference, repo, config).await?;
    Ok(document)
}

/// Writes the document to stdout.
pub fn print_document(document: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(document.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write document to stdout")
}
