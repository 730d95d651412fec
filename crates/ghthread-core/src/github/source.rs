// SPDX-License-Identifier: Apache-2.0

//! The data source boundary.
//!
//! [`ThreadSource`] is everything the fetch orchestrator needs from GitHub.
//! [`super::client::OctocrabSource`] implements it over the REST API; tests
//! implement it in memory.

use async_trait::async_trait;

use super::ResourceRef;
use super::ratelimit::RateLimitStatus;
use crate::Result;
use crate::error::ThreadError;
use crate::model::{Commit, Review, ReviewComment, Thread, TimelineEvent};
use crate::policy::{CheckStatus, DiffMode};

/// Retrieval operations for one issue or pull request.
///
/// Every method may fail independently; only [`ThreadSource::metadata`]
/// failures are fatal to the caller.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    /// Issue or pull request metadata with its top-level comments.
    ///
    /// Failures are already classified into `NotFound`, `RateLimited` or
    /// `Parse`.
    async fn metadata(&self, resource: &ResourceRef) -> Result<Thread>;

    /// Timeline events in the order GitHub returned them.
    async fn timeline(&self, resource: &ResourceRef) -> Result<Vec<TimelineEvent>>;

    /// Pull request reviews.
    async fn reviews(&self, resource: &ResourceRef) -> Result<Vec<Review>>;

    /// Inline review comments.
    async fn review_comments(&self, resource: &ResourceRef) -> Result<Vec<ReviewComment>>;

    /// Commits included in the pull request.
    async fn commits(&self, resource: &ResourceRef) -> Result<Vec<Commit>>;

    /// The unified diff, or the changed file names one per line.
    async fn diff(&self, resource: &ResourceRef, mode: DiffMode) -> Result<String>;

    /// Legacy commit statuses and check runs for a commit.
    async fn check_status(&self, resource: &ResourceRef, sha: &str) -> Result<CheckStatus>;

    /// Title of another issue or pull request, used for link hydration.
    async fn issue_title(&self, owner: &str, repo: &str, number: u64) -> Result<String>;

    /// Raw bytes of an image.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Classifies a failed primary fetch.
///
/// Looks at the diagnostic text and HTTP status of the failure, then at the
/// rate limit probe (if one could be made):
/// - "rate limit" in the text, HTTP 429, or an exhausted quota: `RateLimited`
/// - "not found", "could not resolve", or HTTP 404: `NotFound`
/// - anything else: `Parse`
#[must_use]
pub fn classify_failure(
    resource: &ResourceRef,
    diagnostic: &str,
    status: Option<u16>,
    probe: Option<&RateLimitStatus>,
) -> ThreadError {
    let lower = diagnostic.to_lowercase();

    if lower.contains("rate limit") || status == Some(429) {
        return ThreadError::RateLimited {
            message: diagnostic.to_string(),
        };
    }

    if lower.contains("not found") || lower.contains("could not resolve") || status == Some(404)
    {
        return ThreadError::NotFound {
            reference: resource.to_string(),
        };
    }

    if probe.is_some_and(RateLimitStatus::is_exhausted) {
        return ThreadError::RateLimited {
            message: diagnostic.to_string(),
        };
    }

    ThreadError::Parse {
        what: format!("metadata for {resource}"),
        message: diagnostic.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ResourceKind;

    fn resource() -> ResourceRef {
        ResourceRef::new("o", "r", 5, ResourceKind::Issue)
    }

    fn probe(remaining: u32) -> RateLimitStatus {
        RateLimitStatus {
            remaining,
            limit: 5000,
            reset_at: 0,
        }
    }

    #[test]
    fn test_rate_limit_text() {
        let err = classify_failure(
            &resource(),
            "API rate limit exceeded for 1.2.3.4",
            Some(403),
            None,
        );
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_status_429() {
        let err = classify_failure(&resource(), "Too Many Requests", Some(429), None);
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_not_found() {
        let err = classify_failure(&resource(), "Not Found", Some(404), Some(&probe(4000)));
        assert!(matches!(err, ThreadError::NotFound { reference } if reference == "o/r#5"));
    }

    #[test]
    fn test_exhausted_probe_means_rate_limited() {
        let err = classify_failure(&resource(), "Forbidden", Some(403), Some(&probe(0)));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_other_failures_are_parse_errors() {
        let err = classify_failure(
            &resource(),
            "expected value at line 1 column 1",
            None,
            Some(&probe(10)),
        );
        assert!(matches!(err, ThreadError::Parse { .. }));
    }
}
