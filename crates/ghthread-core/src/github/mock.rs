// SPDX-License-Identifier: Apache-2.0

//! In-memory [`ThreadSource`] for orchestration tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::source::ThreadSource;
use super::{ResourceKind, ResourceRef};
use crate::Result;
use crate::error::ThreadError;
use crate::model::{
    Comment, Commit, Issue, PullInfo, Review, ReviewComment, Thread, ThreadState, TimelineEvent,
};
use crate::policy::{CheckStatus, DiffMode};

pub(crate) struct MockSource {
    pub thread: Thread,
    pub missing: bool,
    pub rate_limited_attempts: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub timeline: Vec<TimelineEvent>,
    pub timeline_fails: bool,
    pub timeline_delay: Option<Duration>,
    pub timeline_finished: AtomicBool,
    pub reviews: Vec<Review>,
    pub review_comments: Vec<ReviewComment>,
    pub commits: Vec<Commit>,
    pub review_calls: AtomicUsize,
    pub diff_calls: Mutex<Vec<DiffMode>>,
    pub checks: Option<CheckStatus>,
    pub check_calls: AtomicUsize,
    pub titles: HashMap<u64, String>,
    pub images: HashMap<String, Vec<u8>>,
}

fn failure(what: &str) -> ThreadError {
    ThreadError::GitHub {
        message: format!("{what} unavailable"),
    }
}

impl MockSource {
    pub fn issue(number: u64) -> Self {
        let resource = ResourceRef::new("o", "r", number, ResourceKind::Issue);
        let issue = Issue::builder()
            .url(resource.html_url())
            .resource(resource)
            .title("Parser crashes on empty input".to_string())
            .body("It crashes.".to_string())
            .author("alice".to_string())
            .state(ThreadState::Open)
            .maybe_created_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single())
            .build();
        Self::with_issue(issue)
    }

    pub fn pull(number: u64, additions: u64, deletions: u64, state: ThreadState) -> Self {
        let resource = ResourceRef::new("o", "r", number, ResourceKind::Pull);
        let issue = Issue::builder()
            .url(resource.html_url())
            .resource(resource)
            .title("Handle empty input".to_string())
            .body("Fixes the crash.".to_string())
            .author("bob".to_string())
            .state(state)
            .maybe_created_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single())
            .pull(PullInfo {
                additions,
                deletions,
                head_sha: "abc1234def".to_string(),
                base_ref: "main".to_string(),
                head_ref: "fix-empty".to_string(),
                draft: false,
            })
            .build();
        Self::with_issue(issue)
    }

    fn with_issue(issue: Issue) -> Self {
        Self {
            thread: Thread {
                issue,
                comments: Vec::new(),
                html: Vec::new(),
            },
            missing: false,
            rate_limited_attempts: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            timeline: Vec::new(),
            timeline_fails: false,
            timeline_delay: None,
            timeline_finished: AtomicBool::new(false),
            reviews: Vec::new(),
            review_comments: Vec::new(),
            commits: Vec::new(),
            review_calls: AtomicUsize::new(0),
            diff_calls: Mutex::new(Vec::new()),
            checks: None,
            check_calls: AtomicUsize::new(0),
            titles: HashMap::new(),
            images: HashMap::new(),
        }
    }

    pub fn with_comment(mut self, author: &str, body: &str, minute: u32) -> Self {
        let id = self.thread.comments.len() as u64 + 1;
        self.thread.comments.push(Comment {
            id,
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).single(),
            url: format!("{}#issuecomment-{id}", self.thread.issue.url),
        });
        self
    }
}

#[async_trait]
impl ThreadSource for MockSource {
    async fn metadata(&self, resource: &ResourceRef) -> Result<Thread> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing {
            return Err(ThreadError::NotFound {
                reference: resource.to_string(),
            });
        }
        let remaining = self.rate_limited_attempts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.rate_limited_attempts
                .store(remaining - 1, Ordering::SeqCst);
            return Err(ThreadError::RateLimited {
                message: "API rate limit exceeded".to_string(),
            });
        }
        Ok(self.thread.clone())
    }

    async fn timeline(&self, _resource: &ResourceRef) -> Result<Vec<TimelineEvent>> {
        if let Some(delay) = self.timeline_delay {
            tokio::time::sleep(delay).await;
        }
        self.timeline_finished.store(true, Ordering::SeqCst);
        if self.timeline_fails {
            return Err(failure("timeline"));
        }
        Ok(self.timeline.clone())
    }

    async fn reviews(&self, _resource: &ResourceRef) -> Result<Vec<Review>> {
        self.review_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reviews.clone())
    }

    async fn review_comments(&self, _resource: &ResourceRef) -> Result<Vec<ReviewComment>> {
        Ok(self.review_comments.clone())
    }

    async fn commits(&self, _resource: &ResourceRef) -> Result<Vec<Commit>> {
        Ok(self.commits.clone())
    }

    async fn diff(&self, _resource: &ResourceRef, mode: DiffMode) -> Result<String> {
        self.diff_calls
            .lock()
            .map_err(|_| failure("diff"))?
            .push(mode);
        Ok(match mode {
            DiffMode::Full => "diff --git a/src/lib.rs b/src/lib.rs\n+fn fixed() {}".to_string(),
            DiffMode::NamesOnly => "src/lib.rs\nsrc/parser.rs".to_string(),
        })
    }

    async fn check_status(&self, _resource: &ResourceRef, _sha: &str) -> Result<CheckStatus> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.checks.clone().ok_or_else(|| failure("checks"))
    }

    async fn issue_title(&self, _owner: &str, _repo: &str, number: u64) -> Result<String> {
        self.titles
            .get(&number)
            .cloned()
            .ok_or_else(|| failure("title"))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.images.get(url).cloned().ok_or_else(|| failure("image"))
    }
}
