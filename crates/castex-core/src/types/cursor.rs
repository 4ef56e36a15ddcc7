//! Pagination cursor type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque continuation token issued by the feed API.
///
/// Only valid relative to the page that returned it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap an upstream cursor. Empty strings signal exhaustion and yield `None`.
    pub fn from_upstream(value: Option<String>) -> Option<Self> {
        value.filter(|s| !s.is_empty()).map(Self)
    }

    /// Returns the token as sent upstream.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
