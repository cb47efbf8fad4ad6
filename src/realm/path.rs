//! Hierarchical realm paths.
//!
//! A [`RealmPath`] is an absolute, `/`-delimited key such as `/even/two`. The root
//! realm is `/`. Paths are normalized at construction: a missing leading separator
//! is added and a trailing one dropped, so that a path parameter captured greedily
//! from a URL (`even/two`) addresses the same realm as its full form. Empty
//! segments are rejected, and a segment can never contain the separator.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Raised when text cannot be turned into a [`RealmPath`] or a path segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid realm path '{path}': {reason}")]
pub struct InvalidPath {
    pub path: String,
    pub reason: String,
}

impl InvalidPath {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Absolute, normalized realm path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RealmPath(String);

impl RealmPath {
    /// The root path, `/`.
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    /// Parse and normalize a path.
    ///
    /// ```rust
    /// use idm_core::realm::RealmPath;
    ///
    /// let path = RealmPath::parse("even/two/").unwrap();
    /// assert_eq!(path.as_str(), "/even/two");
    /// assert!(RealmPath::parse("/even//two").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        let trimmed = raw.trim_start_matches(SEPARATOR).trim_end_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        if trimmed.split(SEPARATOR).any(str::is_empty) {
            return Err(InvalidPath::new(raw, "empty path segment"));
        }

        Ok(Self(format!("{}{}", SEPARATOR, trimmed)))
    }

    /// Path of a direct child named `segment`.
    pub fn child(&self, segment: &str) -> Result<Self, InvalidPath> {
        if segment.is_empty() {
            return Err(InvalidPath::new(segment, "empty path segment"));
        }
        if segment.contains(SEPARATOR) {
            return Err(InvalidPath::new(
                segment,
                "path segment cannot contain the separator",
            ));
        }

        if self.is_root() {
            Ok(Self(format!("{}{}", SEPARATOR, segment)))
        } else {
            Ok(Self(format!("{}{}{}", self.0, SEPARATOR, segment)))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Parent path; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) | None => Some(Self::root()),
            Some(index) => Some(Self(self.0[..index].to_string())),
        }
    }

    /// Last segment, or `/` for the root.
    pub fn name(&self) -> &str {
        if self.is_root() {
            return &self.0;
        }
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches(SEPARATOR).count()
        }
    }

    /// Whether `other` is this path or lies below it.
    pub fn contains(&self, other: &RealmPath) -> bool {
        if self.is_root() || self.0 == other.0 {
            return true;
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Half-open string range `[self/, self0)` holding every strict descendant
    /// of a non-root path.
    ///
    /// Siblings such as `/even-x` sort between `/even` and `/even/two`, so the
    /// descendants are only contiguous once the parent itself is excluded. `0`
    /// is the character right after the separator.
    pub(crate) fn descendant_bounds(&self) -> (String, String) {
        (format!("{}{}", self.0, SEPARATOR), format!("{}0", self.0))
    }
}

impl Borrow<str> for RealmPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RealmPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RealmPath {
    type Error = InvalidPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RealmPath> for String {
    fn from(path: RealmPath) -> Self {
        path.0
    }
}
