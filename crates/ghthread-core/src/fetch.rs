// SPDX-License-Identifier: Apache-2.0

//! Concurrent fetch orchestration.
//!
//! The metadata fetch and the timeline fetch start together; for references
//! already known to be pull requests, reviews, review comments and commits
//! start alongside them. Diff, CI status and image downloads wait for the
//! metadata because they depend on it. Only a metadata failure is fatal; it
//! drops every sibling still in flight.

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, instrument, warn};

use crate::Result;
use crate::error::ThreadError;
use crate::github::ResourceRef;
use crate::github::source::ThreadSource;
use crate::model::{Commit, Record, Review, ReviewComment, Thread, TimelineEvent};
use crate::policy::{CheckStatus, DiffMode, choose_diff_mode, should_fetch_checks};
use crate::rewrite::{ImageMap, localize_images};

/// Knobs for one fetch.
#[derive(Debug, Clone, bon::Builder)]
pub struct FetchOptions {
    /// Full diff below this many changed lines, file names otherwise.
    #[builder(default = crate::config::DEFAULT_DIFF_THRESHOLD)]
    pub diff_threshold: u64,
    /// Scratch directory for images; `None` skips image localization.
    pub image_dir: Option<PathBuf>,
    /// Width of the link-title and image fan-out.
    #[builder(default = 8)]
    pub max_concurrency: usize,
}

/// Reviews, review comments and commits of a pull request.
#[derive(Debug, Clone, Default)]
pub struct PullRecords {
    /// Reviews.
    pub reviews: Vec<Review>,
    /// Inline review comments.
    pub review_comments: Vec<ReviewComment>,
    /// Commits.
    pub commits: Vec<Commit>,
}

/// The diff as fetched, with the mode that was chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSection {
    /// Mode the diff was fetched in.
    pub mode: DiffMode,
    /// Unified diff, or file names one per line.
    pub content: String,
}

/// Everything fetched for one thread.
#[derive(Debug, Clone)]
pub struct FetchedThread {
    /// Metadata and top-level comments.
    pub thread: Thread,
    /// Timeline events in arrival order (empty if the fetch failed).
    pub timeline: Vec<TimelineEvent>,
    /// Pull request records (empty for issues).
    pub pull: PullRecords,
    /// Diff, for pull requests whose diff could be fetched.
    pub diff: Option<DiffSection>,
    /// CI status, for open pull requests whose status could be fetched.
    pub checks: Option<CheckStatus>,
    /// Localized attachments.
    pub images: ImageMap,
}

impl FetchedThread {
    /// Every body that may contain links: the description and each record.
    #[must_use]
    pub fn bodies(&self) -> Vec<&str> {
        std::iter::once(self.thread.issue.body.as_str())
            .chain(self.thread.comments.iter().map(|c| c.body.as_str()))
            .chain(self.pull.reviews.iter().map(|r| r.body.as_str()))
            .chain(self.pull.review_comments.iter().map(|c| c.body.as_str()))
            .chain(self.pull.commits.iter().map(|c| c.body.as_str()))
            .collect()
    }

    /// Moves all records out, in arrival order: comments, reviews, review
    /// comments, commits, then timeline events.
    pub fn take_records(&mut self) -> Vec<Record> {
        let comments = std::mem::take(&mut self.thread.comments);
        let pull = std::mem::take(&mut self.pull);
        let timeline = std::mem::take(&mut self.timeline);

        comments
            .into_iter()
            .map(Record::Comment)
            .chain(pull.reviews.into_iter().map(Record::Review))
            .chain(pull.review_comments.into_iter().map(Record::ReviewComment))
            .chain(pull.commits.into_iter().map(Record::Commit))
            .chain(timeline.into_iter().map(Record::Event))
            .collect()
    }
}

/// Awaits an auxiliary fetch, logging and defaulting on failure.
async fn soft<T: Default>(
    what: &'static str,
    resource: &ResourceRef,
    fetch: impl Future<Output = Result<T>>,
) -> T {
    match fetch.await {
        Ok(value) => value,
        Err(e) => {
            warn!(resource = %resource, error = %e, "Failed to fetch {what}, continuing without it");
            T::default()
        }
    }
}

async fn fetch_pull_records(source: &dyn ThreadSource, resource: &ResourceRef) -> PullRecords {
    let (reviews, review_comments, commits) = tokio::join!(
        soft("reviews", resource, source.reviews(resource)),
        soft("review comments", resource, source.review_comments(resource)),
        soft("commits", resource, source.commits(resource)),
    );
    PullRecords {
        reviews,
        review_comments,
        commits,
    }
}

/// Fetches every artifact of `resource`.
///
/// # Errors
///
/// Returns the metadata error (`NotFound`, `RateLimited`, `Parse`, ...)
/// when the primary fetch fails; all other failures degrade to empty results.
#[instrument(skip(source, options), fields(resource = %resource))]
pub async fn fetch_thread(
    source: &dyn ThreadSource,
    resource: &ResourceRef,
    options: &FetchOptions,
) -> Result<FetchedThread> {
    let eager_pull = resource.is_pull();

    let primary = async {
        let thread = source.metadata(resource).await?;
        let issue = &thread.issue;
        let needs_pull_records = !eager_pull && issue.resource.is_pull();

        let diff = async {
            let Some(pull) = issue.pull.as_ref() else {
                return None;
            };
            let mode = choose_diff_mode(pull.additions, pull.deletions, options.diff_threshold);
            debug!(changed = pull.changed_lines(), ?mode, "Chose diff mode");
            match source.diff(&issue.resource, mode).await {
                Ok(content) => Some(DiffSection { mode, content }),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch diff, continuing without it");
                    None
                }
            }
        };

        let checks = async {
            if !should_fetch_checks(issue) {
                return None;
            }
            let Some(sha) = issue.pull.as_ref().map(|p| p.head_sha.as_str()) else {
                return None;
            };
            match source.check_status(&issue.resource, sha).await {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch CI status, continuing without it");
                    None
                }
            }
        };

        let images = async {
            let Some(dir) = options.image_dir.as_deref() else {
                return ImageMap::new();
            };
            let markdown: Vec<&str> = std::iter::once(issue.body.as_str())
                .chain(thread.comments.iter().map(|c| c.body.as_str()))
                .collect();
            localize_images(source, &thread.html, &markdown, dir, options.max_concurrency).await
        };

        let pull_records = async {
            if needs_pull_records {
                Some(fetch_pull_records(source, &issue.resource).await)
            } else {
                None
            }
        };

        let (diff, checks, images, pull_records) = tokio::join!(diff, checks, images, pull_records);
        Ok::<_, ThreadError>((thread, diff, checks, images, pull_records))
    };

    let timeline = async {
        Ok::<_, ThreadError>(soft("timeline", resource, source.timeline(resource)).await)
    };

    let early_pull = async {
        Ok::<_, ThreadError>(if eager_pull {
            Some(fetch_pull_records(source, resource).await)
        } else {
            None
        })
    };

    let ((thread, diff, checks, images, late_pull), timeline, early_pull) =
        tokio::try_join!(primary, timeline, early_pull)?;

    let pull = if thread.issue.resource.is_pull() {
        early_pull.or(late_pull).unwrap_or_default()
    } else {
        PullRecords::default()
    };

    debug!(
        comments = thread.comments.len(),
        events = timeline.len(),
        reviews = pull.reviews.len(),
        review_comments = pull.review_comments.len(),
        commits = pull.commits.len(),
        images = images.len(),
        "Fetched thread"
    );

    Ok(FetchedThread {
        thread,
        timeline,
        pull,
        diff,
        checks,
        images,
    })
}
