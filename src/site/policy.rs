//! Listener policies.
//!
//! Each listener (plaintext, encrypted) selects one of three behaviours.
//! Unknown values are rejected at load time; nothing downstream ever sees a
//! raw policy string.

use std::fmt;
use std::str::FromStr;

/// What the plaintext (port 80) listener does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpPolicy {
    Nothing,
    Redirect,
    HttpProxyPass,
}

/// What the encrypted (port 443) listener does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpsPolicy {
    Nothing,
    HttpsProxyPass,
    HttpProxyPass,
}

/// Error for a policy string outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy {
    pub value: String,
    pub expected: &'static [&'static str],
}

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized value `{}` (expected one of: {})",
            self.value,
            self.expected.join(", ")
        )
    }
}

impl HttpPolicy {
    pub const ACCEPTED: &'static [&'static str] = &["nothing", "redirect", "http_proxy_pass"];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpPolicy::Nothing => "nothing",
            HttpPolicy::Redirect => "redirect",
            HttpPolicy::HttpProxyPass => "http_proxy_pass",
        }
    }

    /// Whether the plaintext listener is emitted at all.
    pub fn is_enabled(self) -> bool {
        self != HttpPolicy::Nothing
    }
}

impl FromStr for HttpPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nothing" => Ok(HttpPolicy::Nothing),
            "redirect" => Ok(HttpPolicy::Redirect),
            "http_proxy_pass" => Ok(HttpPolicy::HttpProxyPass),
            other => Err(UnknownPolicy {
                value: other.to_string(),
                expected: Self::ACCEPTED,
            }),
        }
    }
}

impl HttpsPolicy {
    pub const ACCEPTED: &'static [&'static str] = &["nothing", "https_proxy_pass", "http_proxy_pass"];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpsPolicy::Nothing => "nothing",
            HttpsPolicy::HttpsProxyPass => "https_proxy_pass",
            HttpsPolicy::HttpProxyPass => "http_proxy_pass",
        }
    }

    pub fn is_enabled(self) -> bool {
        self != HttpsPolicy::Nothing
    }
}

impl FromStr for HttpsPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nothing" => Ok(HttpsPolicy::Nothing),
            "https_proxy_pass" => Ok(HttpsPolicy::HttpsProxyPass),
            "http_proxy_pass" => Ok(HttpsPolicy::HttpProxyPass),
            other => Err(UnknownPolicy {
                value: other.to_string(),
                expected: Self::ACCEPTED,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_policies() {
        assert_eq!("redirect".parse::<HttpPolicy>(), Ok(HttpPolicy::Redirect));
        assert_eq!(
            "https_proxy_pass".parse::<HttpsPolicy>(),
            Ok(HttpsPolicy::HttpsProxyPass)
        );
        assert_eq!(HttpsPolicy::HttpProxyPass.as_str(), "http_proxy_pass");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = "bogus".parse::<HttpPolicy>().unwrap_err();
        assert_eq!(err.value, "bogus");
        assert!(err.to_string().contains("redirect"));

        // `redirect` is only meaningful on the plaintext listener
        assert!("redirect".parse::<HttpsPolicy>().is_err());
    }

    #[test]
    fn test_only_nothing_disables_a_listener() {
        assert!(!HttpPolicy::Nothing.is_enabled());
        assert!(HttpPolicy::Redirect.is_enabled());
        assert!(!HttpsPolicy::Nothing.is_enabled());
        assert!(HttpsPolicy::HttpProxyPass.is_enabled());
    }
}
