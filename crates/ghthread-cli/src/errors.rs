// SPDX-License-Identifier: Apache-2.0

//! CLI error formatting with user-facing hints.
//!
//! Downcasts `anyhow::Error` to `ThreadError` and appends a hint suited to
//! the terminal. Not-found errors are shown verbatim.

use anyhow::Error;
use ghthread_core::error::ThreadError;

/// Formats an error for CLI display with helpful hints.
///
/// If the error is not a `ThreadError`, returns the error chain.
pub fn format_error(error: &Error) -> String {
    let Some(err) = error.downcast_ref::<ThreadError>() else {
        return format!("{error:#}");
    };

    match err {
        ThreadError::NotFound { .. } | ThreadError::InvalidReference { .. } => err.to_string(),
        ThreadError::NotAuthenticated => format!(
            "{err}\n\nTip: Run `ghthread auth status` to see which token sources were checked."
        ),
        ThreadError::RateLimited { .. } => format!(
            "{err}\n\nTip: Wait for the quota to reset, or raise `[fetch] rate_limit_retries` in {}.",
            ghthread_core::config_file_path().display()
        ),
        ThreadError::Parse { .. } => format!(
            "{err}\n\nTip: GitHub returned something unexpected. Re-run with -v for request details."
        ),
        ThreadError::GitHub { .. } => {
            format!("{err}\n\nTip: Check your GitHub token with `ghthread auth status`.")
        }
        ThreadError::Network(_) => {
            format!("{err}\n\nTip: Check your internet connection and try again.")
        }
        ThreadError::Io(_) => format!(
            "{err}\n\nTip: Check that the scratch directory is writable, or pass --no-images."
        ),
        ThreadError::Config { .. } => format!(
            "{err}\n\nTip: Check your config file at {}",
            ghthread_core::config_file_path().display()
        ),
    }
}
