//! Validated site descriptors.
//!
//! # Responsibilities
//! - Strongly typed view of one hosted site
//! - Canonical ordering of pattern sets (sorted, for reproducible output)
//! - Pattern shape checks that would otherwise corrupt the emitted syntax
//!
//! # Design Decisions
//! - Constructed once by `config::validation`; read-only afterwards
//! - Sets are `BTreeSet` so iteration order is the canonical order
//! - Server names keep insertion order (`IndexSet`)

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexSet;

use crate::site::policy::{HttpPolicy, HttpsPolicy};

/// Characters that would terminate or restructure a directive.
const SYNTAX_CHARS: &[char] = &[';', '{', '}', '"', '\'', '#'];

/// Upstream origin address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub ip: String,
    pub http_port: u16,
    pub https_port: u16,
}

impl Origin {
    /// `scheme://ip:port` for the chosen origin encryption.
    pub fn url(&self, encrypted: bool) -> String {
        if encrypted {
            format!("https://{}:{}", self.ip, self.https_port)
        } else {
            format!("http://{}:{}", self.ip, self.http_port)
        }
    }
}

/// A password-protected path pattern, stored without its leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathPattern(String);

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("pattern is empty".to_string());
        }
        if raw.starts_with('/') {
            return Err(format!("pattern `{raw}` must not start with `/`"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(format!("pattern `{raw}` contains whitespace"));
        }
        if let Some(c) = raw.chars().find(|c| SYNTAX_CHARS.contains(c)) {
            return Err(format!("pattern `{raw}` contains reserved character `{c}`"));
        }
        Ok(Self(raw.to_string()))
    }

    /// Patterns with a `.` name a single file and match exactly.
    pub fn is_file_literal(&self) -> bool {
        self.0.contains('.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A path regex cached with its own TTL.
///
/// Ordered by regex first so the canonical order is alphabetical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheException {
    pub location_regex: String,
    pub cache_time_minutes: u32,
}

impl CacheException {
    pub fn parse(location_regex: &str, cache_time_minutes: u32) -> Result<Self, String> {
        if location_regex.is_empty() {
            return Err("location_regex is empty".to_string());
        }
        if location_regex
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '"' | '\''))
        {
            return Err(format!(
                "location_regex `{location_regex}` contains whitespace, a quote or `;`"
            ));
        }
        regex::RegexBuilder::new(location_regex)
            .case_insensitive(true)
            .build()
            .map_err(|e| format!("location_regex `{location_regex}` is not a valid regex: {e}"))?;

        Ok(Self {
            location_regex: location_regex.to_string(),
            cache_time_minutes,
        })
    }
}

/// One hosted site, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDescriptor {
    /// Catalog key; used in error messages.
    pub name: String,
    pub server_names: IndexSet<String>,
    pub public_domain: String,
    pub dnet: String,
    pub origin: Origin,
    pub uploaded_cert_bundle_name: Option<String>,
    pub http_request_does: HttpPolicy,
    pub https_request_does: HttpsPolicy,
    pub password_protected_paths: BTreeSet<PathPattern>,
    pub cache_exceptions: BTreeSet<CacheException>,
    pub default_cache_time_minutes: u32,
}

impl SiteDescriptor {
    /// Space-separated server names in insertion order.
    pub fn server_name_list(&self) -> String {
        self.server_names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when at least one listener is emitted for this site.
    pub fn has_listeners(&self) -> bool {
        self.http_request_does.is_enabled() || self.https_request_does.is_enabled()
    }

    pub fn has_encrypted_listener(&self) -> bool {
        self.https_request_does.is_enabled()
    }
}

/// A system site: rendered from the external template, never compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSite {
    pub name: String,
    pub origin_ip: String,
    pub origin_http_port: u16,
}

impl SystemSite {
    pub fn proxy_pass(&self) -> String {
        format!("http://{}:{}", self.origin_ip, self.origin_http_port)
    }
}

/// Checks a name that becomes a file name in the output tree.
pub fn check_file_name(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.contains('/') || value.contains('\\') || value.contains("..") {
        return Err(format!("`{value}` is not usable as a file name"));
    }
    if value.chars().any(|c| c.is_whitespace() || SYNTAX_CHARS.contains(&c)) {
        return Err(format!("`{value}` contains whitespace or reserved characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_pattern_shapes() {
        assert!(PathPattern::parse("wp-login.php").unwrap().is_file_literal());
        assert!(!PathPattern::parse("admin").unwrap().is_file_literal());

        assert!(PathPattern::parse("").is_err());
        assert!(PathPattern::parse("/admin").is_err());
        assert!(PathPattern::parse("ad min").is_err());
        assert!(PathPattern::parse("admin;return").is_err());
        assert!(PathPattern::parse("a{b}").is_err());
    }

    #[test]
    fn test_patterns_sort_canonically() {
        let set: BTreeSet<_> = ["zeta", "a.b", "c"]
            .iter()
            .map(|p| PathPattern::parse(p).unwrap())
            .collect();
        let order: Vec<_> = set.iter().map(PathPattern::as_str).collect();
        assert_eq!(order, vec!["a.b", "c", "zeta"]);
    }

    #[test]
    fn test_cache_exception_validation() {
        assert!(CacheException::parse("/feed/.*", 5).is_ok());
        assert!(CacheException::parse("", 5).is_err());
        assert!(CacheException::parse("/a b", 5).is_err());
        assert!(CacheException::parse("/(unclosed", 5).is_err());
        assert!(CacheException::parse("^/news\";return", 5).is_err());
        assert!(CacheException::parse("^/it's", 5).is_err());
        assert!(CacheException::parse("^/news\"", 5).is_err());
    }

    #[test]
    fn test_origin_url() {
        let origin = Origin {
            ip: "10.0.0.1".into(),
            http_port: 80,
            https_port: 443,
        };
        assert_eq!(origin.url(true), "https://10.0.0.1:443");
        assert_eq!(origin.url(false), "http://10.0.0.1:80");
    }

    #[test]
    fn test_file_name_check() {
        assert!(check_file_name("example.org").is_ok());
        assert!(check_file_name("../etc").is_err());
        assert!(check_file_name("a/b").is_err());
        assert!(check_file_name("").is_err());
    }
}
