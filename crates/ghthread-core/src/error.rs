// SPDX-License-Identifier: Apache-2.0

//! Error types for ghthread.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use thiserror::Error;

/// Errors that can occur while fetching and rendering a thread.
#[derive(Error, Debug)]
pub enum ThreadError {
    /// The issue or pull request does not exist or is not visible to the token.
    #[error("Could not find {reference} - it does not exist or you do not have access to it")]
    NotFound {
        /// The `owner/repo#number` reference that was requested.
        reference: String,
    },

    /// GitHub reported that the API rate limit is exhausted.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimited {
        /// Diagnostic text from the failed request.
        message: String,
    },

    /// A response that had to be structured data could not be decoded.
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed (e.g., "issue metadata").
        what: String,
        /// Diagnostic text from the decoder or the API.
        message: String,
    },

    /// GitHub API error from octocrab.
    #[error("GitHub API error: {message}")]
    GitHub {
        /// Error message.
        message: String,
    },

    /// Network/HTTP error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Filesystem error (scratch directory, image files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// The reference could not be understood as an issue or pull request.
    #[error("{message}")]
    InvalidReference {
        /// Explanation including the accepted formats.
        message: String,
    },

    /// No GitHub token could be resolved.
    #[error(
        "Authentication required - set GH_TOKEN or GITHUB_TOKEN, or log in with `gh auth login`"
    )]
    NotAuthenticated,
}

impl ThreadError {
    /// Returns true if the error should trigger a retry of the whole operation.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ThreadError::RateLimited { .. })
    }
}

impl From<octocrab::Error> for ThreadError {
    fn from(err: octocrab::Error) -> Self {
        ThreadError::GitHub {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for ThreadError {
    fn from(err: config::ConfigError) -> Self {
        ThreadError::Config {
            message: err.to_string(),
        }
    }
}
