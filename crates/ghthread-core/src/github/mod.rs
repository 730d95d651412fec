// SPDX-License-Identifier: Apache-2.0

//! GitHub integration module.
//!
//! Parses issue and pull request references and provides the data source
//! used by the fetch orchestrator.

use tracing::debug;

use crate::error::ThreadError;

pub mod auth;
pub mod client;
#[cfg(test)]
pub(crate) mod mock;
pub mod ratelimit;
pub mod source;

/// Whether a reference points at an issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Plain issue.
    Issue,
    /// Pull request.
    Pull,
}

impl ResourceKind {
    /// Returns the display name for this kind.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Issue => "issue",
            ResourceKind::Pull => "pull request",
        }
    }

    /// Returns the URL path segment for this kind.
    #[must_use]
    pub fn url_segment(&self) -> &'static str {
        match self {
            ResourceKind::Issue => "issues",
            ResourceKind::Pull => "pull",
        }
    }
}

/// An issue or pull request in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue or pull request number.
    pub number: u64,
    /// Issue or pull request.
    pub kind: ResourceKind,
}

impl ResourceRef {
    /// Creates a reference.
    #[must_use]
    pub fn new(owner: &str, repo: &str, number: u64, kind: ResourceKind) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
            kind,
        }
    }

    /// Returns true for pull requests.
    #[must_use]
    pub fn is_pull(&self) -> bool {
        self.kind == ResourceKind::Pull
    }

    /// The same reference with a different kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Web URL of the issue or pull request.
    #[must_use]
    pub fn html_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/{}/{}",
            self.owner,
            self.repo,
            self.kind.url_segment(),
            self.number
        )
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

const ACCEPTED_FORMATS: &str = "Expected one of:\n\
     - Full URL: https://github.com/owner/repo/issues/123 or .../pull/123\n\
     - Short form: owner/repo#123\n\
     - Bare number with --repo flag: 123 --repo owner/repo";

fn invalid(message: String) -> ThreadError {
    ThreadError::InvalidReference { message }
}

/// Parses an owner/repo string to extract owner and repo.
///
/// Validates format: exactly one `/`, non-empty parts.
///
/// # Errors
///
/// Returns an error if the format is invalid.
pub fn parse_owner_repo(s: &str) -> Result<(String, String), ThreadError> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(invalid(format!(
            "Invalid owner/repo format.\n\
             Expected: owner/repo\n\
             Got: {s}"
        )));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

fn parse_number(text: &str, input: &str) -> Result<u64, ThreadError> {
    text.parse().map_err(|_| {
        invalid(format!(
            "Invalid issue or pull request number '{text}'.\n{ACCEPTED_FORMATS}\nGot: {input}"
        ))
    })
}

/// Parses a GitHub issue or pull request reference.
///
/// Supports:
/// - Full URL: `https://github.com/owner/repo/issues/123` or `https://github.com/owner/repo/pull/123`
///   (query strings, fragments and trailing segments such as `/files` are ignored)
/// - Short form: `owner/repo#123`
/// - Bare number: `123` (requires `repo_context`)
///
/// Short and bare forms cannot tell issues from pull requests; they come back
/// as [`ResourceKind::Issue`] and the metadata fetch corrects the kind.
///
/// # Errors
///
/// Returns `ThreadError::InvalidReference` if the format is invalid or a bare
/// number is used without context.
pub fn parse_reference(input: &str, repo_context: Option<&str>) -> Result<ResourceRef, ThreadError> {
    let input = input.trim();

    // Try full URL first
    if input.starts_with("https://") || input.starts_with("http://") {
        // Remove trailing fragments and query params
        let clean_url = input.split('#').next().unwrap_or(input);
        let clean_url = clean_url.split('?').next().unwrap_or(clean_url);

        // Expected: ["https:", "", "github.com", "owner", "repo", "issues/pull", "123", ...]
        let parts: Vec<&str> = clean_url.trim_end_matches('/').split('/').collect();
        if parts.len() < 7 || (parts[2] != "github.com" && parts[2] != "www.github.com") {
            return Err(invalid(format!(
                "URL must be a GitHub issue or pull request URL.\n{ACCEPTED_FORMATS}\nGot: {input}"
            )));
        }

        let kind = match parts[5] {
            "issues" => ResourceKind::Issue,
            "pull" | "pulls" => ResourceKind::Pull,
            _ => {
                return Err(invalid(format!(
                    "URL must point to an issue or pull request.\n{ACCEPTED_FORMATS}\nGot: {input}"
                )));
            }
        };

        let number = parse_number(parts[6], input)?;
        let resource = ResourceRef::new(parts[3], parts[4], number, kind);
        debug!(resource = %resource, kind = kind.display_name(), "Parsed URL reference");
        return Ok(resource);
    }

    // Try short form: owner/repo#123
    if let Some((owner_repo, number_part)) = input.split_once('#') {
        let (owner, repo) = match (owner_repo.is_empty(), repo_context) {
            (true, Some(ctx)) => parse_owner_repo(ctx)?,
            _ => parse_owner_repo(owner_repo)?,
        };
        let number = parse_number(number_part, input)?;
        let resource = ResourceRef::new(&owner, &repo, number, ResourceKind::Issue);
        debug!(resource = %resource, "Parsed short-form reference");
        return Ok(resource);
    }

    // Try bare number: 123 (requires repo_context)
    if let Ok(number) = input.parse::<u64>() {
        let repo_context = repo_context.ok_or_else(|| {
            invalid(format!(
                "Bare number requires repository context.\n{ACCEPTED_FORMATS}\nGot: {input}"
            ))
        })?;
        let (owner, repo) = parse_owner_repo(repo_context)?;
        let resource = ResourceRef::new(&owner, &repo, number, ResourceKind::Issue);
        debug!(resource = %resource, "Parsed bare number reference");
        return Ok(resource);
    }

    Err(invalid(format!(
        "Invalid issue or pull request reference.\n{ACCEPTED_FORMATS}\nGot: {input}"
    )))
}
