// SPDX-License-Identifier: Apache-2.0

//! [`ThreadSource`] over the GitHub REST API.
//!
//! Issue bodies and comments are requested with the `full+json` media type so
//! the response carries both markdown and rendered HTML; the HTML is the only
//! place signed private image URLs appear. Everything else goes through
//! octocrab.

use std::time::Duration;

use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::create_client_with_token;
use super::ratelimit::check_rate_limit;
use super::source::{ThreadSource, classify_failure};
use super::{ResourceKind, ResourceRef};
use crate::Result;
use crate::config::GitHubConfig;
use crate::error::ThreadError;
use crate::model::{
    Comment, Commit, Issue, PullInfo, Review, ReviewComment, ReviewState, Thread, ThreadState,
    TimelineEvent,
};
use crate::policy::{CheckRun, CheckStatus, DiffMode, StatusEntry};
use crate::utils::parse_timestamp;

const API_BASE: &str = "https://api.github.com";
const FULL_MEDIA_TYPE: &str = "application/vnd.github.full+json";
const USER_AGENT: &str = concat!("ghthread/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;
const MAX_PAGES: u32 = 30;

#[derive(Debug, Deserialize)]
struct WireUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct WireLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireIssue {
    title: String,
    body: Option<String>,
    body_html: Option<String>,
    user: Option<WireUser>,
    state: String,
    created_at: Option<String>,
    html_url: String,
    #[serde(default)]
    labels: Vec<WireLabel>,
    pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireBranch {
    #[serde(rename = "ref")]
    name: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WirePull {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    head: WireBranch,
    base: WireBranch,
    #[serde(default)]
    draft: bool,
    merged_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireComment {
    id: u64,
    user: Option<WireUser>,
    body: Option<String>,
    body_html: Option<String>,
    created_at: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct WireReview {
    id: u64,
    user: Option<WireUser>,
    body: Option<String>,
    state: String,
    submitted_at: Option<String>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct WireReviewComment {
    user: Option<WireUser>,
    body: Option<String>,
    path: String,
    #[serde(default)]
    diff_hunk: String,
    created_at: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct WireGitPerson {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCommitDetail {
    message: String,
    author: Option<WireGitPerson>,
    committer: Option<WireGitPerson>,
}

#[derive(Debug, Deserialize)]
struct WireCommit {
    sha: String,
    commit: WireCommitDetail,
    author: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    context: String,
    state: String,
    description: Option<String>,
    target_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCombinedStatus {
    #[serde(default)]
    statuses: Vec<WireStatus>,
}

#[derive(Debug, Deserialize)]
struct WireCheckRun {
    name: String,
    status: String,
    conclusion: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCheckRuns {
    #[serde(default)]
    check_runs: Vec<WireCheckRun>,
}

fn login(user: Option<WireUser>) -> String {
    user.map_or_else(|| "ghost".to_string(), |u| u.login)
}

fn timestamp(value: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    value.and_then(parse_timestamp)
}

/// A failed request before classification.
#[derive(Debug)]
struct Failure {
    status: Option<u16>,
    message: String,
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Pulls `message` out of a GitHub error body, falling back to the raw text.
fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// GitHub REST implementation of [`ThreadSource`].
pub struct OctocrabSource {
    octocrab: Octocrab,
    http: reqwest::Client,
    token: SecretString,
}

impl OctocrabSource {
    /// Builds the octocrab client and the raw HTTP client used for rich
    /// bodies and image downloads.
    ///
    /// # Errors
    ///
    /// Returns an error if either client cannot be built.
    pub fn new(token: &SecretString, config: &GitHubConfig) -> Result<Self> {
        let octocrab =
            create_client_with_token(token, config).map_err(|e| ThreadError::GitHub {
                message: format!("{e:#}"),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.api_timeout_seconds))
            .timeout(Duration::from_secs(config.api_timeout_seconds.saturating_mul(3)))
            .build()?;

        Ok(Self {
            octocrab,
            http,
            token: token.clone(),
        })
    }

    /// GET with the `full+json` media type.
    async fn get_rich<T: DeserializeOwned>(&self, route: &str) -> std::result::Result<T, Failure> {
        let response = self
            .http
            .get(format!("{API_BASE}{route}"))
            .bearer_auth(self.token.expose_secret())
            .header(ACCEPT, FULL_MEDIA_TYPE)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Failure {
                status: Some(status.as_u16()),
                message: api_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| Failure {
            status: None,
            message: e.to_string(),
        })
    }

    async fn get_rich_pages<T: DeserializeOwned>(
        &self,
        route: &str,
    ) -> std::result::Result<Vec<T>, Failure> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let items: Vec<T> = self
                .get_rich(&format!("{route}?per_page={PER_PAGE}&page={page}"))
                .await?;
            let done = items.len() < PER_PAGE;
            all.extend(items);
            if done {
                break;
            }
        }
        Ok(all)
    }

    async fn get_pages<T: DeserializeOwned>(&self, route: &str) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let items: Vec<T> = self
                .octocrab
                .get(format!("{route}?per_page={PER_PAGE}&page={page}"), None::<&()>)
                .await?;
            let done = items.len() < PER_PAGE;
            all.extend(items);
            if done {
                break;
            }
        }
        Ok(all)
    }

    /// Turns a failed primary request into `NotFound`, `RateLimited` or
    /// `Parse`, probing the rate limit for a second opinion.
    async fn diagnose(&self, resource: &ResourceRef, failure: Failure) -> ThreadError {
        let probe = match check_rate_limit(&self.octocrab).await {
            Ok(status) => Some(status),
            Err(e) => {
                debug!(error = %e, "Rate limit probe failed");
                None
            }
        };
        let error = classify_failure(resource, &failure.message, failure.status, probe.as_ref());
        warn!(resource = %resource, status = ?failure.status, error = %error, "Metadata fetch failed");
        error
    }

    fn repo_route(resource: &ResourceRef) -> String {
        format!("/repos/{}/{}", resource.owner, resource.repo)
    }
}

#[async_trait]
impl ThreadSource for OctocrabSource {
    #[instrument(skip(self), fields(resource = %resource))]
    async fn metadata(&self, resource: &ResourceRef) -> Result<Thread> {
        let issue_route = format!("{}/issues/{}", Self::repo_route(resource), resource.number);
        let comments_route = format!("{issue_route}/comments");

        let (issue, comments) = tokio::join!(
            self.get_rich::<WireIssue>(&issue_route),
            self.get_rich_pages::<WireComment>(&comments_route)
        );
        let issue = match issue {
            Ok(issue) => issue,
            Err(failure) => return Err(self.diagnose(resource, failure).await),
        };
        let comments = match comments {
            Ok(comments) => comments,
            Err(failure) => return Err(self.diagnose(resource, failure).await),
        };

        let kind = if issue.pull_request.is_some() {
            ResourceKind::Pull
        } else {
            ResourceKind::Issue
        };
        let resource = resource.clone().with_kind(kind);

        let pull = if resource.is_pull() {
            let route = format!("{}/pulls/{}", Self::repo_route(&resource), resource.number);
            match self.get_rich::<WirePull>(&route).await {
                Ok(pull) => Some(pull),
                Err(failure) => return Err(self.diagnose(&resource, failure).await),
            }
        } else {
            None
        };

        let state = match (&pull, issue.state.as_str()) {
            (Some(p), _) if p.merged_at.is_some() => ThreadState::Merged,
            (_, "closed") => ThreadState::Closed,
            _ => ThreadState::Open,
        };

        let mut html = Vec::with_capacity(comments.len() + 1);
        html.extend(issue.body_html.clone());

        let comments = comments
            .into_iter()
            .map(|c| {
                html.extend(c.body_html);
                Comment {
                    id: c.id,
                    author: login(c.user),
                    body: c.body.unwrap_or_default(),
                    created_at: timestamp(c.created_at.as_deref()),
                    url: c.html_url,
                }
            })
            .collect::<Vec<_>>();

        let issue = Issue::builder()
            .resource(resource)
            .title(issue.title)
            .body(issue.body.unwrap_or_default())
            .author(login(issue.user))
            .state(state)
            .maybe_created_at(timestamp(issue.created_at.as_deref()))
            .url(issue.html_url)
            .labels(issue.labels.into_iter().map(|l| l.name).collect())
            .maybe_pull(pull.map(|p| PullInfo {
                additions: p.additions,
                deletions: p.deletions,
                head_sha: p.head.sha,
                base_ref: p.base.name,
                head_ref: p.head.name,
                draft: p.draft,
            }))
            .build();

        debug!(
            kind = issue.resource.kind.display_name(),
            comments = comments.len(),
            "Fetched metadata"
        );
        Ok(Thread {
            issue,
            comments,
            html,
        })
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn timeline(&self, resource: &ResourceRef) -> Result<Vec<TimelineEvent>> {
        let route = format!(
            "{}/issues/{}/timeline",
            Self::repo_route(resource),
            resource.number
        );
        let raw: Vec<Value> = self.get_pages(&route).await?;
        let events: Vec<TimelineEvent> = raw.iter().filter_map(TimelineEvent::from_value).collect();
        debug!(raw = raw.len(), kept = events.len(), "Fetched timeline");
        Ok(events)
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn reviews(&self, resource: &ResourceRef) -> Result<Vec<Review>> {
        let route = format!(
            "{}/pulls/{}/reviews",
            Self::repo_route(resource),
            resource.number
        );
        let raw: Vec<WireReview> = self.get_pages(&route).await?;
        Ok(raw
            .into_iter()
            .map(|r| Review {
                id: r.id,
                author: login(r.user),
                state: ReviewState::from_api(&r.state),
                body: r.body.unwrap_or_default(),
                submitted_at: timestamp(r.submitted_at.as_deref()),
                url: r.html_url,
            })
            .collect())
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn review_comments(&self, resource: &ResourceRef) -> Result<Vec<ReviewComment>> {
        let route = format!(
            "{}/pulls/{}/comments",
            Self::repo_route(resource),
            resource.number
        );
        let raw: Vec<WireReviewComment> = self.get_pages(&route).await?;
        Ok(raw
            .into_iter()
            .map(|c| ReviewComment {
                author: login(c.user),
                body: c.body.unwrap_or_default(),
                path: c.path,
                diff_hunk: c.diff_hunk,
                created_at: timestamp(c.created_at.as_deref()),
                url: c.html_url,
            })
            .collect())
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn commits(&self, resource: &ResourceRef) -> Result<Vec<Commit>> {
        let route = format!(
            "{}/pulls/{}/commits",
            Self::repo_route(resource),
            resource.number
        );
        let raw: Vec<WireCommit> = self.get_pages(&route).await?;
        Ok(raw
            .into_iter()
            .map(|c| {
                let detail = c.commit;
                let author = c
                    .author
                    .map(|u| u.login)
                    .or_else(|| detail.author.as_ref().and_then(|a| a.name.clone()))
                    .unwrap_or_else(|| "unknown".to_string());
                let date = detail
                    .committer
                    .as_ref()
                    .and_then(|p| p.date.as_deref())
                    .or_else(|| detail.author.as_ref().and_then(|p| p.date.as_deref()));
                Commit::from_message(c.sha, author, &detail.message, timestamp(date))
            })
            .collect())
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn diff(&self, resource: &ResourceRef, mode: DiffMode) -> Result<String> {
        match mode {
            DiffMode::Full => Ok(self
                .octocrab
                .pulls(&resource.owner, &resource.repo)
                .get_diff(resource.number)
                .await?),
            DiffMode::NamesOnly => {
                let route = format!(
                    "{}/pulls/{}/files",
                    Self::repo_route(resource),
                    resource.number
                );
                let files: Vec<WireFile> = self.get_pages(&route).await?;
                Ok(files
                    .into_iter()
                    .map(|f| f.filename)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn check_status(&self, resource: &ResourceRef, sha: &str) -> Result<CheckStatus> {
        let base = format!("{}/commits/{sha}", Self::repo_route(resource));
        let status_route = format!("{base}/status");
        let runs_route = format!("{base}/check-runs?per_page={PER_PAGE}");

        let (combined, runs) = tokio::try_join!(
            self.octocrab
                .get::<WireCombinedStatus, _, _>(&status_route, None::<&()>),
            self.octocrab.get::<WireCheckRuns, _, _>(&runs_route, None::<&()>)
        )?;

        Ok(CheckStatus {
            statuses: combined
                .statuses
                .into_iter()
                .map(|s| StatusEntry {
                    context: s.context,
                    state: s.state,
                    description: s.description,
                    target_url: s.target_url,
                })
                .collect(),
            check_runs: runs
                .check_runs
                .into_iter()
                .map(|r| CheckRun {
                    name: r.name,
                    status: r.status,
                    conclusion: r.conclusion,
                    url: r.html_url,
                })
                .collect(),
        })
    }

    #[instrument(skip(self))]
    async fn issue_title(&self, owner: &str, repo: &str, number: u64) -> Result<String> {
        let issue = self.octocrab.issues(owner, repo).get(number).await?;
        Ok(issue.title)
    }

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self.http.get(url);
        if url.starts_with("https://github.com/") || url.starts_with("https://api.github.com/") {
            request = request.bearer_auth(self.token.expose_secret());
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_extracts_json_message() {
        assert_eq!(
            api_message(r#"{"message":"Not Found","documentation_url":"x"}"#),
            "Not Found"
        );
    }

    #[test]
    fn test_api_message_falls_back_to_text() {
        assert_eq!(api_message("  upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_wire_issue_with_pull_marker() {
        let json = r#"{
            "title": "Add feature",
            "body": "text",
            "body_html": "<p>text</p>",
            "user": {"login": "octocat"},
            "state": "open",
            "created_at": "2024-01-01T00:00:00Z",
            "html_url": "https://github.com/o/r/pull/1",
            "labels": [{"name": "enhancement"}],
            "pull_request": {"url": "x"}
        }"#;
        let issue: WireIssue = serde_json::from_str(json).unwrap();
        assert!(issue.pull_request.is_some());
        assert_eq!(issue.labels[0].name, "enhancement");
    }

    #[test]
    fn test_deleted_user_is_ghost() {
        assert_eq!(login(None), "ghost");
    }

    #[tokio::test]
    async fn test_new_builds_clients() {
        let config = GitHubConfig::default();
        let source = OctocrabSource::new(&SecretString::from("test-token"), &config);
        assert!(source.is_ok());
    }

    #[tokio::test]
    async fn test_new_accepts_huge_timeout() {
        let config = GitHubConfig {
            api_timeout_seconds: u64::MAX,
        };
        let source = OctocrabSource::new(&SecretString::from("test-token"), &config);
        assert!(source.is_ok());
    }
}
