//! Location matching conditions.
//!
//! # Responsibilities
//! - Describe how a rule selects request paths (exact, prefix, regex, named)
//! - Render the condition as location arguments
//! - Evaluate a condition against a path (used for overlap diagnostics)
//!
//! # Design Decisions
//! - Exact matches are used for file literals (`= /wp-login.php`)
//! - Directory patterns become prefixes anchored with a trailing `/`
//! - Regex matches are always case-insensitive (`~*`)
//! - Named locations never match a path; they are only jumped into

use std::fmt;

use crate::rules::continuation::Continuation;
use crate::site::descriptor::PathPattern;

/// Extensions served by the static-asset rule.
pub const STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "json", "png", "gif", "ico", "jpg", "jpeg", "svg", "ttf", "woff", "woff2",
];

/// How a location selects requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationMatch {
    Exact(String),
    Prefix(String),
    CaseInsensitiveRegex(String),
    Named(Continuation),
}

impl LocationMatch {
    /// Exact match for file literals, `/`-anchored prefix otherwise.
    pub fn for_protected_path(pattern: &PathPattern) -> Self {
        if pattern.is_file_literal() {
            LocationMatch::Exact(format!("/{pattern}"))
        } else {
            LocationMatch::Prefix(format!("/{pattern}/"))
        }
    }

    pub fn static_assets() -> Self {
        LocationMatch::CaseInsensitiveRegex(format!(r"\.({})$", STATIC_EXTENSIONS.join("|")))
    }

    pub fn catch_all() -> Self {
        LocationMatch::Prefix("/".to_string())
    }

    pub fn is_named(&self) -> bool {
        matches!(self, LocationMatch::Named(_))
    }

    /// Whether a request for `path` would satisfy this condition in isolation.
    pub fn matches_path(&self, path: &str) -> bool {
        match self {
            LocationMatch::Exact(expected) => path == expected,
            LocationMatch::Prefix(prefix) => path.starts_with(prefix.as_str()),
            LocationMatch::CaseInsensitiveRegex(re) => regex::RegexBuilder::new(re)
                .case_insensitive(true)
                .build()
                .map(|r| r.is_match(path))
                .unwrap_or(false),
            LocationMatch::Named(_) => false,
        }
    }
}

impl fmt::Display for LocationMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationMatch::Exact(path) => write!(f, "= {path}"),
            LocationMatch::Prefix(prefix) => f.write_str(prefix),
            // Braces would open a block unless quoted
            LocationMatch::CaseInsensitiveRegex(re) if re.contains(['{', '}']) => {
                write!(f, "~* \"{re}\"")
            }
            LocationMatch::CaseInsensitiveRegex(re) => write!(f, "~* {re}"),
            LocationMatch::Named(c) => write!(f, "{c}"),
        }
    }
}
