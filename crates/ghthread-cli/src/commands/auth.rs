// SPDX-License-Identifier: Apache-2.0

//! Auth status command.

use console::style;
use ghthread_core::github::auth::create_client_with_token;
use ghthread_core::{AppConfig, TokenSource, check_rate_limit, resolve_token};
use tracing::debug;

/// Result of probing the token chain and the API quota.
pub struct StatusReport {
    /// Where the token came from, if any.
    pub source: Option<TokenSource>,
    /// Rate limit summary, or the reason it could not be read.
    pub quota: Option<Result<String, String>>,
}

/// Resolves the token and asks GitHub for the remaining quota.
pub async fn run_status(config: &AppConfig) -> StatusReport {
    let Some((token, source)) = resolve_token() else {
        return StatusReport {
            source: None,
            quota: None,
        };
    };

    let quota = match create_client_with_token(&token, &config.github) {
        Ok(client) => match check_rate_limit(&client).await {
            Ok(status) => Ok(status.message()),
            Err(e) => Err(e.to_string()),
        },
        Err(e) => Err(format!("{e:#}")),
    };
    debug!(?quota, "Rate limit probe finished");

    StatusReport {
        source: Some(source),
        quota: Some(quota),
    }
}

/// Prints the status report to stdout.
pub fn print_status(report: &StatusReport) {
    match report.source {
        Some(source) => println!(
            "{} Authenticated via {}",
            style("✓").green().bold(),
            style(source).cyan()
        ),
        None => {
            println!("{} Not authenticated", style("✗").red().bold());
            println!(
                "  Set {} or {}, or run {}",
                style("GH_TOKEN").cyan(),
                style("GITHUB_TOKEN").cyan(),
                style("gh auth login").cyan()
            );
        }
    }

    match &report.quota {
        Some(Ok(message)) => println!("  {message}"),
        Some(Err(message)) => println!(
            "  {} Could not read rate limit: {message}",
            style("!").yellow()
        ),
        None => {}
    }
}
