// SPDX-License-Identifier: Apache-2.0

//! Timestamp and text helpers shared by the fetch and render stages.

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// Parses an ISO 8601 / RFC 3339 timestamp as returned by the GitHub API.
///
/// Returns `None` for empty or malformed input; callers treat a missing
/// timestamp as the oldest possible value.
///
/// # Examples
///
/// ```
/// use ghthread_core::utils::parse_timestamp;
///
/// assert!(parse_timestamp("2024-01-01T00:00:00Z").is_some());
/// assert!(parse_timestamp("not-a-date").is_none());
/// ```
#[must_use]
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a timestamp in the given offset as `YYYY-MM-DD HH:MM`.
///
/// A missing timestamp renders as `unknown time`.
#[must_use]
pub fn format_timestamp(dt: Option<DateTime<Utc>>, offset: &FixedOffset) -> String {
    match dt {
        Some(dt) => dt.with_timezone(offset).format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown time".to_string(),
    }
}

/// The offset of the local timezone right now.
#[must_use]
pub fn local_offset() -> FixedOffset {
    *Local::now().offset()
}

/// The UTC offset.
#[must_use]
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Quotes every line of `text` as a markdown blockquote.
#[must_use]
pub fn blockquote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Picks a code fence long enough that `content` cannot close it early.
#[must_use]
pub fn fence_for(content: &str) -> String {
    let longest = content
        .lines()
        .map(|line| line.trim_start().chars().take_while(|c| *c == '`').count())
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
