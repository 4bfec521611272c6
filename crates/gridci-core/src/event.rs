//! Repository events received from the version-control host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of repository event that can trigger a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Push => write!(f, "push"),
            EventKind::PullRequest => write!(f, "pull_request"),
        }
    }
}

/// Whether the event's ref is a branch or a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Branch,
    Tag,
}

/// An immutable repository event, as produced by the version-control host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub ref_name: String,
    pub ref_kind: RefKind,
}

impl Event {
    pub fn new(kind: EventKind, ref_name: impl Into<String>, ref_kind: RefKind) -> Self {
        Self {
            kind,
            ref_name: ref_name.into(),
            ref_kind,
        }
    }

    /// Push to a branch.
    pub fn push(ref_name: impl Into<String>) -> Self {
        Self::new(EventKind::Push, ref_name, RefKind::Branch)
    }

    /// Push of a tag.
    pub fn tag(ref_name: impl Into<String>) -> Self {
        Self::new(EventKind::Push, ref_name, RefKind::Tag)
    }

    /// Pull request targeting a branch.
    pub fn pull_request(ref_name: impl Into<String>) -> Self {
        Self::new(EventKind::PullRequest, ref_name, RefKind::Branch)
    }
}
