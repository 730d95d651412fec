// SPDX-License-Identifier: Apache-2.0

//! Timeline events and event groups.
//!
//! GitHub's timeline endpoint returns loosely-typed records tagged with an
//! `event` field. Each kind is decoded into an [`EventKind`] variant that
//! carries only the fields that kind actually has.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::utils::parse_timestamp;

/// The issue or pull request on the other end of a cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReference {
    /// Title of the referencing issue or pull request.
    pub title: String,
    /// URL of the referencing issue or pull request.
    pub url: String,
    /// Whether the source is a pull request.
    pub is_pull: bool,
}

/// A timeline event kind with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum EventKind {
    Labeled { label: String },
    Unlabeled { label: String },
    Milestoned { title: String },
    Demilestoned { title: String },
    Assigned { assignee: String },
    Unassigned { assignee: String },
    Renamed { from: String, to: String },
    Closed,
    Reopened,
    CrossReferenced { source: CrossReference },
    Referenced { commit_id: Option<String> },
    HeadRefForcePushed,
    HeadRefDeleted,
    HeadRefRestored,
    Merged { commit_id: Option<String> },
    ReviewRequested { reviewer: String },
    ReviewRequestRemoved { reviewer: String },
    ReviewDismissed,
    Deployed,
    ReadyForReview,
    ConvertToDraft,
    Locked,
    Unlocked,
    Pinned,
    Unpinned,
    Transferred,
    /// Any kind this tool does not render.
    Other { name: String },
}

impl EventKind {
    /// The `event` tag GitHub uses for this kind.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            EventKind::Labeled { .. } => "labeled",
            EventKind::Unlabeled { .. } => "unlabeled",
            EventKind::Milestoned { .. } => "milestoned",
            EventKind::Demilestoned { .. } => "demilestoned",
            EventKind::Assigned { .. } => "assigned",
            EventKind::Unassigned { .. } => "unassigned",
            EventKind::Renamed { .. } => "renamed",
            EventKind::Closed => "closed",
            EventKind::Reopened => "reopened",
            EventKind::CrossReferenced { .. } => "cross-referenced",
            EventKind::Referenced { .. } => "referenced",
            EventKind::HeadRefForcePushed => "head_ref_force_pushed",
            EventKind::HeadRefDeleted => "head_ref_deleted",
            EventKind::HeadRefRestored => "head_ref_restored",
            EventKind::Merged { .. } => "merged",
            EventKind::ReviewRequested { .. } => "review_requested",
            EventKind::ReviewRequestRemoved { .. } => "review_request_removed",
            EventKind::ReviewDismissed => "review_dismissed",
            EventKind::Deployed => "deployed",
            EventKind::ReadyForReview => "ready_for_review",
            EventKind::ConvertToDraft => "convert_to_draft",
            EventKind::Locked => "locked",
            EventKind::Unlocked => "unlocked",
            EventKind::Pinned => "pinned",
            EventKind::Unpinned => "unpinned",
            EventKind::Transferred => "transferred",
            EventKind::Other { name } => name,
        }
    }

    /// Whether consecutive events of this kind may collapse into one group.
    #[must_use]
    pub fn is_groupable(&self) -> bool {
        matches!(
            self,
            EventKind::Labeled { .. }
                | EventKind::Unlabeled { .. }
                | EventKind::Assigned { .. }
                | EventKind::Unassigned { .. }
                | EventKind::ReviewRequested { .. }
        )
    }

    /// The per-event item listed when a group is rendered (label, assignee, reviewer).
    #[must_use]
    pub fn item(&self) -> Option<&str> {
        match self {
            EventKind::Labeled { label } | EventKind::Unlabeled { label } => Some(label),
            EventKind::Assigned { assignee } | EventKind::Unassigned { assignee } => {
                Some(assignee)
            }
            EventKind::ReviewRequested { reviewer }
            | EventKind::ReviewRequestRemoved { reviewer } => Some(reviewer),
            _ => None,
        }
    }
}

/// Timeline kinds that are rendered from dedicated endpoints or carry nothing
/// worth rendering; they are dropped when the timeline is decoded.
const SHADOWED_KINDS: &[&str] = &[
    "commented",
    "reviewed",
    "committed",
    "line-commented",
    "commit-commented",
    "subscribed",
    "unsubscribed",
    "mentioned",
];

/// A structural state change on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    /// Login of the user who caused the event.
    pub actor: String,
    /// When the event happened, if GitHub reported it.
    pub created_at: Option<DateTime<Utc>>,
    /// Kind and payload.
    pub kind: EventKind,
}

impl TimelineEvent {
    /// Decodes one element of the timeline array.
    ///
    /// Returns `None` for records without an `event` tag and for kinds listed
    /// in the shadowed set.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("event")?.as_str()?;
        if SHADOWED_KINDS.contains(&name) {
            return None;
        }

        let actor = login(value.get("actor"))
            .or_else(|| login(value.get("user")))
            .unwrap_or_else(|| "ghost".to_string());
        let created_at = value
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        let kind = match name {
            "labeled" => EventKind::Labeled {
                label: str_at(value, &["label", "name"]),
            },
            "unlabeled" => EventKind::Unlabeled {
                label: str_at(value, &["label", "name"]),
            },
            "milestoned" => EventKind::Milestoned {
                title: str_at(value, &["milestone", "title"]),
            },
            "demilestoned" => EventKind::Demilestoned {
                title: str_at(value, &["milestone", "title"]),
            },
            "assigned" => EventKind::Assigned {
                assignee: str_at(value, &["assignee", "login"]),
            },
            "unassigned" => EventKind::Unassigned {
                assignee: str_at(value, &["assignee", "login"]),
            },
            "renamed" => EventKind::Renamed {
                from: str_at(value, &["rename", "from"]),
                to: str_at(value, &["rename", "to"]),
            },
            "closed" => EventKind::Closed,
            "reopened" => EventKind::Reopened,
            "cross-referenced" => EventKind::CrossReferenced {
                source: CrossReference {
                    title: str_at(value, &["source", "issue", "title"]),
                    url: str_at(value, &["source", "issue", "html_url"]),
                    is_pull: value
                        .pointer("/source/issue/pull_request")
                        .is_some_and(|v| !v.is_null()),
                },
            },
            "referenced" => EventKind::Referenced {
                commit_id: opt_str(value.get("commit_id")),
            },
            "head_ref_force_pushed" => EventKind::HeadRefForcePushed,
            "head_ref_deleted" => EventKind::HeadRefDeleted,
            "head_ref_restored" => EventKind::HeadRefRestored,
            "merged" => EventKind::Merged {
                commit_id: opt_str(value.get("commit_id")),
            },
            "review_requested" => EventKind::ReviewRequested {
                reviewer: requested_reviewer(value),
            },
            "review_request_removed" => EventKind::ReviewRequestRemoved {
                reviewer: requested_reviewer(value),
            },
            "review_dismissed" => EventKind::ReviewDismissed,
            "deployed" => EventKind::Deployed,
            "ready_for_review" => EventKind::ReadyForReview,
            "convert_to_draft" => EventKind::ConvertToDraft,
            "locked" => EventKind::Locked,
            "unlocked" => EventKind::Unlocked,
            "pinned" => EventKind::Pinned,
            "unpinned" => EventKind::Unpinned,
            "transferred" => EventKind::Transferred,
            other => EventKind::Other {
                name: other.to_string(),
            },
        };

        Some(Self {
            actor,
            created_at,
            kind,
        })
    }
}

fn login(value: Option<&Value>) -> Option<String> {
    opt_str(value?.get("login"))
}

fn opt_str(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn str_at(value: &Value, path: &[&str]) -> String {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Reviewer requests name either a user or a team.
fn requested_reviewer(value: &Value) -> String {
    login(value.get("requested_reviewer"))
        .or_else(|| {
            value
                .pointer("/requested_team/name")
                .and_then(Value::as_str)
                .map(|team| format!("team {team}"))
        })
        .unwrap_or_else(|| "ghost".to_string())
}

/// A non-empty run of timeline events sharing actor, timestamp and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGroup {
    events: Vec<TimelineEvent>,
}

impl EventGroup {
    /// Opens a group with its first event.
    #[must_use]
    pub fn new(first: TimelineEvent) -> Self {
        Self {
            events: vec![first],
        }
    }

    /// The event that opened the group.
    #[must_use]
    pub fn first(&self) -> &TimelineEvent {
        &self.events[0]
    }

    /// All events in arrival order.
    #[must_use]
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// The group's ordering timestamp: its first event's timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.first().created_at
    }

    /// Returns true if `event` may join this group.
    ///
    /// Requires the same actor as the first event, an identical timestamp
    /// that is actually present, and the same kind from the groupable set.
    #[must_use]
    pub fn accepts(&self, event: &TimelineEvent) -> bool {
        let first = self.first();
        first.kind.is_groupable()
            && first.actor == event.actor
            && first.created_at.is_some()
            && first.created_at == event.created_at
            && first.kind.name() == event.kind.name()
    }

    /// Appends an event. Callers check [`EventGroup::accepts`] first.
    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }
}
