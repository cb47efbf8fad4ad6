//! Client-declared response preferences.
//!
//! Two per-request toggles travel as headers: `Prefer` selects whether the
//! response carries the result body, and `X-Null-Priority-Async` selects whether
//! resources without a priority are awaited. Neither is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Header carrying the content preference.
pub const PREFER: &str = "Prefer";
/// Header echoing the content preference the server honored.
pub const PREFERENCE_APPLIED: &str = "Preference-Applied";
/// Header toggling fire-and-forget propagation to no-priority resources.
pub const NULL_PRIORITY_ASYNC: &str = "X-Null-Priority-Async";
/// Header carrying the key generated for a created entity.
pub const RESOURCE_KEY: &str = "X-Resource-Key";
/// Header carrying the URL of a created entity.
pub const LOCATION: &str = "Location";

/// Content preference, as in `Prefer: return-no-content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preference {
    #[default]
    ReturnContent,
    ReturnNoContent,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preference::ReturnContent => "return-content",
            Preference::ReturnNoContent => "return-no-content",
        }
    }

    /// Parse a `Prefer` header value; the first recognized token wins.
    pub fn parse(header: &str) -> Option<Self> {
        header
            .split(',')
            .map(str::trim)
            .find_map(|token| match token.to_ascii_lowercase().as_str() {
                "return-content" => Some(Preference::ReturnContent),
                "return-no-content" => Some(Preference::ReturnNoContent),
                _ => None,
            })
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request response and propagation preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePreference {
    /// Content preference declared by the client, if any
    pub prefer: Option<Preference>,
    /// Do not wait for resources without a priority
    pub null_priority_async: bool,
}

impl ResponsePreference {
    pub fn return_content() -> Self {
        Self {
            prefer: Some(Preference::ReturnContent),
            null_priority_async: false,
        }
    }

    pub fn return_no_content() -> Self {
        Self {
            prefer: Some(Preference::ReturnNoContent),
            null_priority_async: false,
        }
    }

    pub fn with_null_priority_async(mut self, enabled: bool) -> Self {
        self.null_priority_async = enabled;
        self
    }

    /// Build from raw header values. Unknown `Prefer` values are ignored; the
    /// async toggle is set only by a case-insensitive `true`.
    pub fn from_headers(prefer: Option<&str>, null_priority_async: Option<&str>) -> Self {
        Self {
            prefer: prefer.and_then(Preference::parse),
            null_priority_async: null_priority_async
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
        }
    }

    /// Content preference in effect, defaulting to `return-content`.
    pub fn content(&self) -> Preference {
        self.prefer.unwrap_or_default()
    }

    pub fn returns_content(&self) -> bool {
        self.content() == Preference::ReturnContent
    }
}
