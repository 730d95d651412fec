// SPDX-License-Identifier: Apache-2.0

//! GitHub API rate limit probing.
//!
//! Used as the secondary diagnostic when the primary metadata fetch fails:
//! an exhausted core quota means the failure was a rate limit.

use octocrab::Octocrab;
use tracing::debug;

use crate::error::ThreadError;

/// GitHub API rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Number of API calls remaining in the current rate limit window.
    pub remaining: u32,
    /// Total number of API calls allowed in the rate limit window.
    pub limit: u32,
    /// Unix timestamp when the rate limit resets.
    pub reset_at: u64,
}

impl RateLimitStatus {
    /// Returns true if no calls remain in the current window.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Returns a human-readable status message.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "GitHub API: {}/{} calls remaining",
            self.remaining, self.limit
        )
    }
}

/// Checks the GitHub API rate limit status.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn check_rate_limit(client: &Octocrab) -> Result<RateLimitStatus, ThreadError> {
    debug!("Checking GitHub API rate limit");

    let rate_limit = client.ratelimit().get().await?;

    #[allow(clippy::cast_possible_truncation)]
    let status = RateLimitStatus {
        remaining: rate_limit.resources.core.remaining as u32,
        limit: rate_limit.resources.core.limit as u32,
        reset_at: rate_limit.resources.core.reset,
    };

    debug!(
        remaining = status.remaining,
        limit = status.limit,
        "GitHub rate limit status"
    );

    Ok(status)
}
