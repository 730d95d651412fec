// SPDX-License-Identifier: Apache-2.0

//! Document assembly.
//!
//! Layout: title heading, a summary line, labels and branch lines, the
//! description, the CI status section (open pull requests), the
//! chronological timeline, then the diff section (pull requests).

use tracing::{debug, info, instrument};

use crate::Result;
use crate::fetch::{FetchOptions, FetchedThread, fetch_thread};
use crate::github::ResourceRef;
use crate::github::source::ThreadSource;
use crate::merge::render_timeline;
use crate::model::Issue;
use crate::policy::{render_check_status, render_diff};
use crate::render::RenderContext;
use crate::rewrite::{ContentRewriter, fetch_titles, find_link_targets};
use crate::utils::format_timestamp;

fn header(issue: &Issue, ctx: &RenderContext) -> String {
    let mut lines = vec![
        format!("# {} (#{})", issue.title.trim(), issue.resource.number),
        String::new(),
    ];

    let kind = if issue.pull.is_some() {
        "Pull request"
    } else {
        "Issue"
    };
    let state = match &issue.pull {
        Some(pull) if pull.draft => format!("{}, draft", issue.state),
        _ => issue.state.to_string(),
    };
    lines.push(format!(
        "**{kind}** ({state}) opened by @{} on {} | {}",
        issue.author,
        format_timestamp(issue.created_at, &ctx.offset),
        issue.url
    ));

    if !issue.labels.is_empty() {
        lines.push(format!("**Labels:** {}", issue.labels.join(", ")));
    }
    if let Some(pull) = &issue.pull {
        lines.push(format!("**Branch:** `{}` <- `{}`", pull.base_ref, pull.head_ref));
    }

    let body = ctx.rewriter.rewrite(&issue.body).trim().to_string();
    lines.push(String::new());
    if body.is_empty() {
        lines.push("_No description provided._".to_string());
    } else {
        lines.push(body);
    }
    lines.join("\n")
}

/// Assembles the document from fetched data.
#[must_use]
pub fn assemble(mut fetched: FetchedThread, ctx: &RenderContext) -> String {
    let mut sections = vec![header(&fetched.thread.issue, ctx)];

    if let Some(checks) = fetched.checks.as_ref().and_then(render_check_status) {
        sections.push(checks);
    }

    let timeline = render_timeline(fetched.take_records(), ctx);
    if !timeline.is_empty() {
        sections.push("## Timeline".to_string());
        sections.extend(timeline);
    }

    if let (Some(pull), Some(diff)) = (&fetched.thread.issue.pull, &fetched.diff) {
        sections.push(render_diff(
            diff.mode,
            pull.additions,
            pull.deletions,
            &diff.content,
        ));
    }

    let mut document = sections.join("\n\n");
    document.push('\n');
    document
}

/// Fetches every artifact of `resource` and renders the document.
///
/// Link titles are looked up once every body is known; images are
/// localized during the fetch when `options.image_dir` is set.
///
/// # Errors
///
/// Returns the primary metadata error; every other failure degrades.
#[instrument(skip(source, options, offset), fields(resource = %resource))]
pub async fn render_thread(
    source: &dyn ThreadSource,
    resource: &ResourceRef,
    options: &FetchOptions,
    offset: chrono::FixedOffset,
) -> Result<String> {
    let mut fetched = fetch_thread(source, resource, options).await?;

    let targets = find_link_targets(fetched.bodies());
    debug!(links = targets.len(), "Hydrating links");
    let titles = fetch_titles(source, targets, options.max_concurrency).await;

    let images = std::mem::take(&mut fetched.images);
    let ctx = RenderContext::builder()
        .offset(offset)
        .rewriter(ContentRewriter::new(titles, images))
        .build();

    let document = assemble(fetched, &ctx);
    info!(bytes = document.len(), "Rendered thread");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThreadError;
    use crate::github::ResourceKind;
    use crate::github::mock::MockSource;
    use crate::model::{
        Commit, EventKind, Review, ReviewComment, ReviewState, ThreadState, TimelineEvent,
    };
    use crate::policy::{CheckRun, CheckStatus};
    use crate::utils::utc_offset;
    use chrono::{TimeZone, Utc};

    fn options() -> FetchOptions {
        FetchOptions::builder().build()
    }

    #[tokio::test]
    async fn test_issue_document_layout() {
        let mut source = MockSource::issue(5).with_comment("carol", "Same here", 1);
        source.thread.issue.labels = vec!["bug".to_string(), "urgent".to_string()];
        source.timeline = vec![TimelineEvent {
            actor: "alice".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).single(),
            kind: EventKind::Closed,
        }];
        let resource = ResourceRef::new("o", "r", 5, ResourceKind::Issue);

        let doc = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap();

        assert!(doc.starts_with("# Parser crashes on empty input (#5)\n"));
        assert!(doc.contains("**Issue** (open) opened by @alice on 2024-03-01 09:00"));
        assert!(doc.contains("**Labels:** bug, urgent"));
        assert!(!doc.contains("**Branch:**"));
        let comment = doc.find("@carol commented").unwrap();
        let closed = doc.find("closed this").unwrap();
        assert!(comment < closed);
    }

    #[tokio::test]
    async fn test_pull_document_sections_in_order() {
        let mut source = MockSource::pull(7, 10, 5, ThreadState::Open)
            .with_comment("carol", "LGTM", 2);
        source.checks = Some(CheckStatus {
            statuses: vec![],
            check_runs: vec![CheckRun {
                name: "test".to_string(),
                status: "completed".to_string(),
                conclusion: Some("success".to_string()),
                url: None,
            }],
        });
        let resource = ResourceRef::new("o", "r", 7, ResourceKind::Pull);

        let doc = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap();

        let branch = doc.find("**Branch:** `main` <- `fix-empty`").unwrap();
        let ci = doc.find("## CI status").unwrap();
        let timeline = doc.find("## Timeline").unwrap();
        let diff = doc.find("## Diff (+10 -5)").unwrap();
        assert!(branch < ci && ci < timeline && timeline < diff);
        assert!(doc.contains("```diff\ndiff --git"));
    }

    #[tokio::test]
    async fn test_simultaneous_records_keep_arrival_order() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).single();
        let mut source =
            MockSource::pull(7, 1, 1, ThreadState::Merged).with_comment("carol", "Ship it", 30);
        source.timeline = vec![TimelineEvent {
            actor: "bob".to_string(),
            created_at: ts,
            kind: EventKind::Labeled {
                label: "ready".to_string(),
            },
        }];
        source.commits = vec![Commit::from_message(
            "0123456789abcdef".to_string(),
            "bob".to_string(),
            "Guard empty input",
            ts,
        )];
        source.review_comments = vec![ReviewComment {
            author: "erin".to_string(),
            body: "Nit".to_string(),
            path: "src/parse.rs".to_string(),
            diff_hunk: String::new(),
            created_at: ts,
            url: String::new(),
        }];
        source.reviews = vec![Review {
            id: 1,
            author: "dave".to_string(),
            state: ReviewState::Approved,
            body: String::new(),
            submitted_at: ts,
            url: String::new(),
        }];
        let resource = ResourceRef::new("o", "r", 7, ResourceKind::Pull);

        let doc = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap();

        let positions: Vec<usize> = [
            "### @carol commented",
            "@dave approved these changes",
            "commented on `src/parse.rs`",
            "### Commit `0123456`",
            "added label ready",
        ]
        .iter()
        .map(|needle| doc.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{doc}");
    }

    #[tokio::test]
    async fn test_links_are_hydrated() {
        let mut source =
            MockSource::issue(5).with_comment("carol", "Duplicate of https://github.com/o/r/issues/3", 1);
        source.titles.insert(3, "Crash on startup".to_string());
        let resource = ResourceRef::new("o", "r", 5, ResourceKind::Issue);

        let doc = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap();

        assert!(doc.contains("Duplicate of [Crash on startup](https://github.com/o/r/issues/3)"));
    }

    #[tokio::test]
    async fn test_leading_link_is_hydrated() {
        let mut source =
            MockSource::issue(5).with_comment("carol", " https://github.com/o/r/issues/3", 1);
        source.thread.issue.body = " https://github.com/o/r/issues/3".to_string();
        source.titles.insert(3, "Fix crash".to_string());
        let resource = ResourceRef::new("o", "r", 5, ResourceKind::Issue);

        let doc = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap();

        assert_eq!(
            doc.matches("[Fix crash](https://github.com/o/r/issues/3)").count(),
            2
        );
        assert!(!doc.contains("\nhttps://github.com/o/r/issues/3"));
    }

    #[tokio::test]
    async fn test_failed_title_lookup_leaves_url() {
        let source =
            MockSource::issue(5).with_comment("carol", "See https://github.com/o/r/issues/4", 1);
        let resource = ResourceRef::new("o", "r", 5, ResourceKind::Issue);

        let doc = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap();

        assert!(doc.contains("See https://github.com/o/r/issues/4"));
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let mut source = MockSource::issue(5);
        source.missing = true;
        let resource = ResourceRef::new("o", "r", 5, ResourceKind::Issue);

        let err = render_thread(&source, &resource, &options(), utc_offset())
            .await
            .unwrap_err();

        assert!(matches!(err, ThreadError::NotFound { .. }));
    }
}
