// SPDX-License-Identifier: Apache-2.0

//! Chronological merge.
//!
//! Records are stably sorted by timestamp. Consecutive timeline events in
//! that order are buffered and grouped, then every rendered unit is sorted a
//! second time by its own timestamp (a group uses its first event's). Both
//! sorts are stable, so ties keep arrival order. Missing timestamps sort
//! first.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::grouping::group_events;
use crate::model::{Record, TimelineEvent};
use crate::render::{RenderContext, render_group, render_record};

/// A rendered unit with the timestamp it is ordered by.
type Rendered = (DateTime<Utc>, Option<String>);

fn flush(pending: &mut Vec<TimelineEvent>, out: &mut Vec<Rendered>, ctx: &RenderContext) {
    if pending.is_empty() {
        return;
    }
    for group in group_events(pending.drain(..)) {
        let at = group.created_at().unwrap_or(DateTime::UNIX_EPOCH);
        out.push((at, render_group(&group, ctx)));
    }
}

/// Orders, groups and renders `records` (given in arrival order) into the
/// timeline sections of the document. Units that render to nothing are
/// dropped.
#[must_use]
pub fn render_timeline(mut records: Vec<Record>, ctx: &RenderContext) -> Vec<String> {
    records.sort_by_key(Record::sort_key);

    let mut rendered: Vec<Rendered> = Vec::with_capacity(records.len());
    let mut pending = Vec::new();
    for record in records {
        match record {
            Record::Event(event) => pending.push(event),
            other => {
                flush(&mut pending, &mut rendered, ctx);
                rendered.push((other.sort_key(), render_record(&other, ctx)));
            }
        }
    }
    flush(&mut pending, &mut rendered, ctx);

    rendered.sort_by_key(|(at, _)| *at);
    let sections: Vec<String> = rendered.into_iter().filter_map(|(_, text)| text).collect();
    debug!(sections = sections.len(), "Merged timeline");
    sections
}
