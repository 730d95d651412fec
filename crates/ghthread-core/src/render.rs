// SPDX-License-Identifier: Apache-2.0

//! Per-kind rendering of records and event groups.
//!
//! Authored records (comments, reviews, review comments, commits) render as a
//! heading naming the author, the formatted time and a link, followed by the
//! rewritten body. Event groups render as a single bullet line.

use chrono::FixedOffset;

use crate::model::{
    Comment, Commit, EventGroup, EventKind, Record, Review, ReviewComment, ReviewState,
};
use crate::rewrite::ContentRewriter;
use crate::utils::{blockquote, fence_for, format_timestamp};

/// Everything rendering needs besides the record itself.
#[derive(Debug, Clone, bon::Builder)]
pub struct RenderContext {
    /// Offset timestamps are shown in.
    pub offset: FixedOffset,
    /// Link and image rewriting applied to bodies.
    #[builder(default)]
    pub rewriter: ContentRewriter,
}

impl RenderContext {
    fn time(&self, dt: Option<chrono::DateTime<chrono::Utc>>) -> String {
        format_timestamp(dt, &self.offset)
    }

    fn body(&self, body: &str) -> String {
        self.rewriter.rewrite(body).trim().to_string()
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn heading(who: &str, action: &str, time: &str, url: &str) -> String {
    if url.is_empty() {
        format!("### {who} {action} on {time}")
    } else {
        format!("### {who} {action} on {time} ([link]({url}))")
    }
}

fn with_body(heading: String, body: String) -> String {
    if body.is_empty() {
        heading
    } else {
        format!("{heading}\n\n{body}")
    }
}

/// Renders a top-level comment.
#[must_use]
pub fn render_comment(comment: &Comment, ctx: &RenderContext) -> String {
    with_body(
        heading(
            &format!("@{}", comment.author),
            "commented",
            &ctx.time(comment.created_at),
            &comment.url,
        ),
        ctx.body(&comment.body),
    )
}

/// Renders a review, or nothing for an empty comment-only review.
#[must_use]
pub fn render_review(review: &Review, ctx: &RenderContext) -> Option<String> {
    let action = match review.state {
        ReviewState::Approved => "approved these changes",
        ReviewState::ChangesRequested => "requested changes",
        ReviewState::Commented => "reviewed",
        ReviewState::Dismissed => "left a review (dismissed)",
        ReviewState::Pending => "started a review",
    };
    if review.state == ReviewState::Commented && review.body.trim().is_empty() {
        return None;
    }
    Some(with_body(
        heading(
            &format!("@{}", review.author),
            action,
            &ctx.time(review.submitted_at),
            &review.url,
        ),
        ctx.body(&review.body),
    ))
}

/// Renders an inline review comment with its diff hunk.
#[must_use]
pub fn render_review_comment(comment: &ReviewComment, ctx: &RenderContext) -> String {
    let mut out = heading(
        &format!("@{}", comment.author),
        &format!("commented on `{}`", comment.path),
        &ctx.time(comment.created_at),
        &comment.url,
    );
    let hunk = comment.diff_hunk.trim_end();
    if !hunk.is_empty() {
        let fence = fence_for(hunk);
        out.push_str(&format!("\n\n{fence}diff\n{hunk}\n{fence}"));
    }
    let body = ctx.body(&comment.body);
    if !body.is_empty() {
        out.push_str("\n\n");
        out.push_str(&body);
    }
    out
}

/// Renders a commit: short SHA, authors, headline and quoted body.
#[must_use]
pub fn render_commit(commit: &Commit, ctx: &RenderContext) -> String {
    let mut out = format!(
        "### Commit `{}` by {} on {}\n\n**{}**",
        short_sha(&commit.sha),
        commit.authors.join(", "),
        ctx.time(commit.committed_at),
        commit.headline
    );
    let body = ctx.body(&commit.body);
    if !body.is_empty() {
        out.push_str("\n\n");
        out.push_str(&blockquote(&body));
    }
    out
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

/// The action phrase for a group, or `None` for kinds that are not rendered.
fn describe(group: &EventGroup) -> Option<String> {
    let items: Vec<&str> = group.events().iter().filter_map(|e| e.kind.item()).collect();
    let list = items.join(", ");
    let n = items.len();

    let text = match &group.first().kind {
        EventKind::Labeled { .. } => format!("added {} {list}", plural(n, "label", "labels")),
        EventKind::Unlabeled { .. } => format!("removed {} {list}", plural(n, "label", "labels")),
        EventKind::Assigned { .. } => format!("assigned {list}"),
        EventKind::Unassigned { .. } => format!("unassigned {list}"),
        EventKind::ReviewRequested { .. } => format!("requested a review from {list}"),
        EventKind::ReviewRequestRemoved { reviewer } => {
            format!("removed the review request for {reviewer}")
        }
        EventKind::Milestoned { title } => format!("added this to the {title} milestone"),
        EventKind::Demilestoned { title } => format!("removed this from the {title} milestone"),
        EventKind::Renamed { from, to } => format!("changed the title from \"{from}\" to \"{to}\""),
        EventKind::Closed => "closed this".to_string(),
        EventKind::Reopened => "reopened this".to_string(),
        EventKind::CrossReferenced { source } => format!(
            "mentioned this in {} [{}]({})",
            if source.is_pull { "pull request" } else { "issue" },
            source.title,
            source.url
        ),
        EventKind::Referenced { commit_id } => match commit_id {
            Some(sha) => format!("referenced this in commit `{}`", short_sha(sha)),
            None => "referenced this from a commit".to_string(),
        },
        EventKind::HeadRefForcePushed => "force-pushed the head branch".to_string(),
        EventKind::HeadRefDeleted => "deleted the head branch".to_string(),
        EventKind::HeadRefRestored => "restored the head branch".to_string(),
        EventKind::Merged { commit_id } => match commit_id {
            Some(sha) => format!("merged this in commit `{}`", short_sha(sha)),
            None => "merged this".to_string(),
        },
        EventKind::ReviewDismissed => "dismissed a review".to_string(),
        EventKind::Deployed => "deployed this branch".to_string(),
        EventKind::ReadyForReview => "marked this as ready for review".to_string(),
        EventKind::ConvertToDraft => "converted this to a draft".to_string(),
        EventKind::Locked => "locked the conversation".to_string(),
        EventKind::Unlocked => "unlocked the conversation".to_string(),
        EventKind::Pinned => "pinned this issue".to_string(),
        EventKind::Unpinned => "unpinned this issue".to_string(),
        EventKind::Transferred => "transferred this issue".to_string(),
        EventKind::Other { .. } => return None,
    };
    Some(text)
}

/// Renders an event group as one line, or `None` for unrendered kinds.
#[must_use]
pub fn render_group(group: &EventGroup, ctx: &RenderContext) -> Option<String> {
    let action = describe(group)?;
    Some(format!(
        "- **@{}** {action} on {}",
        group.first().actor,
        ctx.time(group.created_at())
    ))
}

/// Renders any record; bare timeline events render as singleton groups.
#[must_use]
pub fn render_record(record: &Record, ctx: &RenderContext) -> Option<String> {
    match record {
        Record::Comment(c) => Some(render_comment(c, ctx)),
        Record::Review(r) => render_review(r, ctx),
        Record::ReviewComment(rc) => Some(render_review_comment(rc, ctx)),
        Record::Commit(c) => Some(render_commit(c, ctx)),
        Record::Event(e) => render_group(&EventGroup::new(e.clone()), ctx),
    }
}
