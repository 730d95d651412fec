// SPDX-License-Identifier: Apache-2.0

//! Diff verbosity and CI status policy for pull requests.
//!
//! Small pull requests get their full unified diff; large ones only list the
//! changed files. CI status is fetched only while the pull request is open.

use crate::model::Issue;
use crate::utils::fence_for;

/// How much of the diff to fetch and render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// Full unified diff.
    Full,
    /// Changed file names only.
    NamesOnly,
}

/// Chooses the diff mode: full when changed lines are strictly below the threshold.
#[must_use]
pub fn choose_diff_mode(additions: u64, deletions: u64, threshold: u64) -> DiffMode {
    if additions + deletions < threshold {
        DiffMode::Full
    } else {
        DiffMode::NamesOnly
    }
}

/// CI status is only worth fetching for pull requests that are still open.
#[must_use]
pub fn should_fetch_checks(issue: &Issue) -> bool {
    issue.pull.is_some() && !issue.state.is_finished()
}

/// Renders the diff section, fenced as `diff` or as a plain block.
#[must_use]
pub fn render_diff(mode: DiffMode, additions: u64, deletions: u64, content: &str) -> String {
    let content = content.trim_end();
    let fence = fence_for(content);
    match mode {
        DiffMode::Full => {
            format!("## Diff (+{additions} -{deletions})\n\n{fence}diff\n{content}\n{fence}")
        }
        DiffMode::NamesOnly => format!(
            "## Changed files (+{additions} -{deletions})\n\n{fence}\n{content}\n{fence}"
        ),
    }
}

/// Normalised outcome of a status entry or check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CheckOutcome {
    Success,
    Failure,
    Error,
    Pending,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    Unknown,
}

impl CheckOutcome {
    /// Maps a legacy commit status `state`.
    #[must_use]
    pub fn from_status_state(state: &str) -> Self {
        match state {
            "success" => CheckOutcome::Success,
            "failure" => CheckOutcome::Failure,
            "error" => CheckOutcome::Error,
            "pending" => CheckOutcome::Pending,
            _ => CheckOutcome::Unknown,
        }
    }

    /// Maps a check run's `status` and `conclusion`.
    #[must_use]
    pub fn from_check_run(status: &str, conclusion: Option<&str>) -> Self {
        if status != "completed" {
            return CheckOutcome::Pending;
        }
        match conclusion {
            Some("success") => CheckOutcome::Success,
            Some("failure") => CheckOutcome::Failure,
            Some("neutral") => CheckOutcome::Neutral,
            Some("cancelled") => CheckOutcome::Cancelled,
            Some("skipped") => CheckOutcome::Skipped,
            Some("timed_out") => CheckOutcome::TimedOut,
            Some("action_required") => CheckOutcome::ActionRequired,
            Some("stale") => CheckOutcome::Stale,
            _ => CheckOutcome::Unknown,
        }
    }

    /// Icon shown in front of the entry.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            CheckOutcome::Success => "✅",
            CheckOutcome::Failure => "❌",
            CheckOutcome::Error => "❗",
            CheckOutcome::Pending => "⏳",
            CheckOutcome::Neutral => "⚪",
            CheckOutcome::Cancelled => "🚫",
            CheckOutcome::Skipped => "⏭️",
            CheckOutcome::TimedOut => "⌛",
            CheckOutcome::ActionRequired => "⚠️",
            CheckOutcome::Stale => "🔄",
            CheckOutcome::Unknown => "❔",
        }
    }

    /// Lower-case label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CheckOutcome::Success => "success",
            CheckOutcome::Failure => "failure",
            CheckOutcome::Error => "error",
            CheckOutcome::Pending => "pending",
            CheckOutcome::Neutral => "neutral",
            CheckOutcome::Cancelled => "cancelled",
            CheckOutcome::Skipped => "skipped",
            CheckOutcome::TimedOut => "timed out",
            CheckOutcome::ActionRequired => "action required",
            CheckOutcome::Stale => "stale",
            CheckOutcome::Unknown => "unknown",
        }
    }

    fn is_failing(self) -> bool {
        matches!(
            self,
            CheckOutcome::Failure
                | CheckOutcome::Error
                | CheckOutcome::Cancelled
                | CheckOutcome::TimedOut
                | CheckOutcome::ActionRequired
        )
    }
}

/// A legacy commit status entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Status context (e.g., `ci/circleci`).
    pub context: String,
    /// Raw state: success, failure, error or pending.
    pub state: String,
    /// Optional description.
    pub description: Option<String>,
    /// Link to the external details.
    pub target_url: Option<String>,
}

/// A check run entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRun {
    /// Check name.
    pub name: String,
    /// queued, `in_progress` or completed.
    pub status: String,
    /// Conclusion once completed.
    pub conclusion: Option<String>,
    /// Link to the run.
    pub url: Option<String>,
}

/// Statuses and check runs reported for the head commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckStatus {
    /// Legacy commit statuses.
    pub statuses: Vec<StatusEntry>,
    /// Check runs.
    pub check_runs: Vec<CheckRun>,
}

impl CheckStatus {
    /// Returns true when nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.check_runs.is_empty()
    }

    fn outcomes(&self) -> impl Iterator<Item = CheckOutcome> + '_ {
        self.statuses
            .iter()
            .map(|s| CheckOutcome::from_status_state(&s.state))
            .chain(
                self.check_runs
                    .iter()
                    .map(|c| CheckOutcome::from_check_run(&c.status, c.conclusion.as_deref())),
            )
    }

    /// Overall outcome: failing beats pending beats success.
    #[must_use]
    pub fn overall(&self) -> CheckOutcome {
        let mut overall = CheckOutcome::Success;
        for outcome in self.outcomes() {
            if outcome.is_failing() {
                return CheckOutcome::Failure;
            }
            if outcome == CheckOutcome::Pending {
                overall = CheckOutcome::Pending;
            }
        }
        overall
    }
}

fn entry_line(outcome: CheckOutcome, name: &str, detail: Option<&str>, url: Option<&str>) -> String {
    let mut line = format!("- {} **{name}** {}", outcome.icon(), outcome.label());
    if let Some(detail) = detail.filter(|d| !d.is_empty()) {
        line.push_str(": ");
        line.push_str(detail);
    }
    if let Some(url) = url.filter(|u| !u.is_empty()) {
        line.push_str(&format!(" ([details]({url}))"));
    }
    line
}

/// Renders the CI status section, or `None` when nothing was reported.
#[must_use]
pub fn render_check_status(status: &CheckStatus) -> Option<String> {
    if status.is_empty() {
        return None;
    }

    let mut lines = vec!["## CI status".to_string(), String::new()];
    for entry in &status.statuses {
        lines.push(entry_line(
            CheckOutcome::from_status_state(&entry.state),
            &entry.context,
            entry.description.as_deref(),
            entry.target_url.as_deref(),
        ));
    }
    for run in &status.check_runs {
        lines.push(entry_line(
            CheckOutcome::from_check_run(&run.status, run.conclusion.as_deref()),
            &run.name,
            None,
            run.url.as_deref(),
        ));
    }

    let overall = status.overall();
    lines.push(String::new());
    lines.push(format!("**Overall:** {} {}", overall.icon(), overall.label()));
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_diff_is_full() {
        assert_eq!(choose_diff_mode(10, 5, 800), DiffMode::Full);
    }

    #[test]
    fn test_large_diff_is_names_only() {
        assert_eq!(choose_diff_mode(900, 50, 800), DiffMode::NamesOnly);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(choose_diff_mode(400, 400, 800), DiffMode::NamesOnly);
        assert_eq!(choose_diff_mode(400, 399, 800), DiffMode::Full);
    }

    #[test]
    fn test_render_full_diff_fenced_as_diff() {
        let out = render_diff(DiffMode::Full, 10, 5, "diff --git a/x b/x\n+new\n");
        assert!(out.contains("```diff\ndiff --git a/x b/x\n+new\n```"));
    }

    #[test]
    fn test_render_names_fenced_plain() {
        let out = render_diff(DiffMode::NamesOnly, 900, 50, "src/a.rs\nsrc/b.rs");
        assert!(out.contains("```\nsrc/a.rs\nsrc/b.rs\n```"));
        assert!(!out.contains("```diff"));
    }

    #[test]
    fn test_check_run_mapping() {
        assert_eq!(
            CheckOutcome::from_check_run("in_progress", None),
            CheckOutcome::Pending
        );
        assert_eq!(
            CheckOutcome::from_check_run("completed", Some("skipped")),
            CheckOutcome::Skipped
        );
        assert_eq!(
            CheckOutcome::from_check_run("completed", Some("mystery")),
            CheckOutcome::Unknown
        );
    }

    #[test]
    fn test_overall_failure_wins() {
        let status = CheckStatus {
            statuses: vec![StatusEntry {
                context: "ci/legacy".to_string(),
                state: "pending".to_string(),
                description: None,
                target_url: None,
            }],
            check_runs: vec![CheckRun {
                name: "test".to_string(),
                status: "completed".to_string(),
                conclusion: Some("failure".to_string()),
                url: None,
            }],
        };
        assert_eq!(status.overall(), CheckOutcome::Failure);
    }

    #[test]
    fn test_overall_pending_over_success() {
        let status = CheckStatus {
            statuses: vec![],
            check_runs: vec![
                CheckRun {
                    name: "lint".to_string(),
                    status: "completed".to_string(),
                    conclusion: Some("success".to_string()),
                    url: None,
                },
                CheckRun {
                    name: "test".to_string(),
                    status: "queued".to_string(),
                    conclusion: None,
                    url: None,
                },
            ],
        };
        assert_eq!(status.overall(), CheckOutcome::Pending);
    }

    #[test]
    fn test_render_check_status_section() {
        let status = CheckStatus {
            statuses: vec![StatusEntry {
                context: "ci/circleci".to_string(),
                state: "success".to_string(),
                description: Some("Your tests passed".to_string()),
                target_url: Some("https://ci.example/1".to_string()),
            }],
            check_runs: vec![CheckRun {
                name: "build".to_string(),
                status: "completed".to_string(),
                conclusion: Some("neutral".to_string()),
                url: None,
            }],
        };
        let out = render_check_status(&status).unwrap();
        assert!(out.starts_with("## CI status"));
        assert!(out.contains(
            "- ✅ **ci/circleci** success: Your tests passed ([details](https://ci.example/1))"
        ));
        assert!(out.contains("- ⚪ **build** neutral"));
        assert!(out.ends_with("**Overall:** ✅ success"));
    }

    #[test]
    fn test_render_empty_check_status() {
        assert!(render_check_status(&CheckStatus::default()).is_none());
    }
}
