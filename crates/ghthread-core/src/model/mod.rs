// SPDX-License-Identifier: Apache-2.0

//! Typed records fetched for one issue or pull request.
//!
//! Every record kind exposes a single ordering timestamp. Records are built
//! once per fetch, consumed by the merge step and then dropped.

pub mod event;

use chrono::{DateTime, Utc};

pub use event::{CrossReference, EventGroup, EventKind, TimelineEvent};

use crate::github::ResourceRef;

/// Open/closed state of the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Open issue or pull request.
    Open,
    /// Closed without merging.
    Closed,
    /// Merged pull request.
    Merged,
}

impl ThreadState {
    /// Closed and merged threads no longer run CI worth reporting.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, ThreadState::Closed | ThreadState::Merged)
    }
}

impl std::fmt::Display for ThreadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadState::Open => write!(f, "open"),
            ThreadState::Closed => write!(f, "closed"),
            ThreadState::Merged => write!(f, "merged"),
        }
    }
}

/// Pull-request-only metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PullInfo {
    /// Lines added across the whole diff.
    pub additions: u64,
    /// Lines deleted across the whole diff.
    pub deletions: u64,
    /// Head commit, used for CI status lookups.
    pub head_sha: String,
    /// Base branch name.
    pub base_ref: String,
    /// Head branch name.
    pub head_ref: String,
    /// Whether the pull request is a draft.
    pub draft: bool,
}

impl PullInfo {
    /// Total changed lines.
    #[must_use]
    pub fn changed_lines(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// Issue or pull request metadata.
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct Issue {
    /// Resolved reference (kind reflects what GitHub reported).
    pub resource: ResourceRef,
    /// Title.
    pub title: String,
    /// Markdown body.
    #[builder(default)]
    pub body: String,
    /// Author login.
    pub author: String,
    /// Current state.
    pub state: ThreadState,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Web URL.
    pub url: String,
    /// Current label names.
    #[builder(default)]
    pub labels: Vec<String>,
    /// Present for pull requests.
    pub pull: Option<PullInfo>,
}

/// Result of the primary metadata fetch: the issue, its comments, and the
/// HTML renderings of the body and comments used for image discovery.
#[derive(Debug, Clone)]
pub struct Thread {
    /// Issue or pull request metadata.
    pub issue: Issue,
    /// Top-level comments in arrival order.
    pub comments: Vec<Comment>,
    /// HTML renderings of the body and each comment.
    pub html: Vec<String>,
}

/// A top-level discussion comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment id.
    pub id: u64,
    /// Author login.
    pub author: String,
    /// Markdown body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Web URL of the comment.
    pub url: String,
}

/// Verdict carried by a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Approved the changes.
    Approved,
    /// Requested changes.
    ChangesRequested,
    /// Commented without a verdict.
    Commented,
    /// Review was dismissed.
    Dismissed,
    /// Review not yet submitted.
    Pending,
}

impl ReviewState {
    /// Maps GitHub's upper-case review state.
    #[must_use]
    pub fn from_api(state: &str) -> Self {
        match state {
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "DISMISSED" => ReviewState::Dismissed,
            "PENDING" => ReviewState::Pending,
            _ => ReviewState::Commented,
        }
    }
}

/// A pull-request-level review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Review id.
    pub id: u64,
    /// Author login.
    pub author: String,
    /// Verdict.
    pub state: ReviewState,
    /// Markdown body (often empty).
    pub body: String,
    /// Submission timestamp.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Web URL of the review.
    pub url: String,
}

/// An inline comment anchored to a diff line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    /// Author login.
    pub author: String,
    /// Markdown body.
    pub body: String,
    /// File the comment is anchored to.
    pub path: String,
    /// Diff context around the anchored line.
    pub diff_hunk: String,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Web URL of the comment.
    pub url: String,
}

const CO_AUTHOR_TRAILER: &str = "co-authored-by:";

/// A commit included in a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Abbreviated or full SHA.
    pub sha: String,
    /// Primary author first, then co-authors.
    pub authors: Vec<String>,
    /// First line of the message.
    pub headline: String,
    /// Remaining message lines, trimmed.
    pub body: String,
    /// Commit timestamp.
    pub committed_at: Option<DateTime<Utc>>,
}

impl Commit {
    /// Splits a full commit message into headline and body, and appends
    /// co-authors named in `Co-authored-by:` trailers.
    #[must_use]
    pub fn from_message(
        sha: String,
        author: String,
        message: &str,
        committed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let (headline, rest) = message.split_once('\n').unwrap_or((message, ""));

        let mut authors = vec![author];
        let mut body_lines = Vec::new();
        for line in rest.lines() {
            let trimmed = line.trim();
            let co_author = trimmed
                .get(..CO_AUTHOR_TRAILER.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(CO_AUTHOR_TRAILER))
                .map(|_| trimmed[CO_AUTHOR_TRAILER.len()..].trim());
            match co_author {
                Some(name) if !name.is_empty() => {
                    let name = name.split(" <").next().unwrap_or(name).to_string();
                    if !authors.contains(&name) {
                        authors.push(name);
                    }
                }
                _ => body_lines.push(line),
            }
        }

        Self {
            sha,
            authors,
            headline: headline.trim().to_string(),
            body: body_lines.join("\n").trim().to_string(),
            committed_at,
        }
    }
}

/// One fetched record of any kind, in the order it arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Top-level comment.
    Comment(Comment),
    /// Pull request review.
    Review(Review),
    /// Inline review comment.
    ReviewComment(ReviewComment),
    /// Pull request commit.
    Commit(Commit),
    /// Timeline event.
    Event(TimelineEvent),
}

impl Record {
    /// The record's ordering timestamp, if present.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Record::Comment(c) => c.created_at,
            Record::Review(r) => r.submitted_at,
            Record::ReviewComment(rc) => rc.created_at,
            Record::Commit(c) => c.committed_at,
            Record::Event(e) => e.created_at,
        }
    }

    /// The ordering timestamp with the epoch standing in for a missing one.
    #[must_use]
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.created_at().unwrap_or(DateTime::UNIX_EPOCH)
    }
}
