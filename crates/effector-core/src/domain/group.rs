use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutual-exclusion tag shared by effects that must never be active together.
///
/// Effects touching the same external addresses share a group; at most one
/// instance per group is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(String);

impl Group {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `None` for an empty tag: an empty group never excludes anything.
    pub fn non_empty(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        if s.trim().is_empty() { None } else { Some(Self(s)) }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Group {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
