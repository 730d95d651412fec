// SPDX-License-Identifier: Apache-2.0

//! Timeline grouping.
//!
//! A single greedy left-to-right partition: an event joins the open group
//! only if [`EventGroup::accepts`] it, otherwise the open group is closed and
//! a new one starts. Events are never reordered.

use crate::model::{EventGroup, TimelineEvent};

/// Partitions events into groups, preserving their order.
#[must_use]
pub fn group_events(events: impl IntoIterator<Item = TimelineEvent>) -> Vec<EventGroup> {
    let mut groups: Vec<EventGroup> = Vec::new();
    for event in events {
        match groups.last_mut() {
            Some(open) if open.accepts(&event) => open.push(event),
            _ => groups.push(EventGroup::new(event)),
        }
    }
    groups
}
