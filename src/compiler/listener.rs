//! Listener policy selection.
//!
//! # Responsibilities
//! - Map each listener's policy to omit / redirect / full rule chain
//! - Decide origin encryption for the proxied chain
//! - Lower a listener to its `server` block
//!
//! # Design Decisions
//! - Policies are already typed; there is no fallback arm
//! - A redirect listener carries no proxying rule at all

use std::path::PathBuf;

use crate::rules::rule::Rule;
use crate::rules::tree::{Block, Directive};
use crate::site::policy::{HttpPolicy, HttpsPolicy};

/// Which client-facing port a listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Plaintext,
    Encrypted,
}

impl ListenerKind {
    pub fn listen(self) -> &'static str {
        match self {
            ListenerKind::Plaintext => "80",
            ListenerKind::Encrypted => "443 ssl http2",
        }
    }

    pub fn is_encrypted(self) -> bool {
        self == ListenerKind::Encrypted
    }
}

/// What the compiler must build for one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPlan {
    Omit,
    Redirect,
    Proxy { origin_encrypted: bool },
}

impl ListenerPlan {
    pub fn plaintext(policy: HttpPolicy) -> Self {
        match policy {
            HttpPolicy::Nothing => ListenerPlan::Omit,
            HttpPolicy::Redirect => ListenerPlan::Redirect,
            HttpPolicy::HttpProxyPass => ListenerPlan::Proxy {
                origin_encrypted: false,
            },
        }
    }

    pub fn encrypted(policy: HttpsPolicy) -> Self {
        match policy {
            HttpsPolicy::Nothing => ListenerPlan::Omit,
            HttpsPolicy::HttpsProxyPass => ListenerPlan::Proxy {
                origin_encrypted: true,
            },
            // Terminate TLS at the edge, plaintext to origin
            HttpsPolicy::HttpProxyPass => ListenerPlan::Proxy {
                origin_encrypted: false,
            },
        }
    }
}

/// TLS material for an encrypted listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub certificate: PathBuf,
    pub certificate_key: PathBuf,
    pub ciphers: String,
}

/// Behaviour of a compiled listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerBehavior {
    /// Permanent redirect to the encrypted listener.
    Redirect,
    /// Ordered rule chain, first match wins.
    Proxy { rules: Vec<Rule> },
}

/// One compiled listener of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub kind: ListenerKind,
    pub server_names: String,
    pub tls: Option<TlsSettings>,
    pub behavior: ListenerBehavior,
}

impl Listener {
    /// Rules in precedence order; empty for redirects.
    pub fn rules(&self) -> &[Rule] {
        match &self.behavior {
            ListenerBehavior::Redirect => &[],
            ListenerBehavior::Proxy { rules } => rules,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.behavior == ListenerBehavior::Redirect
    }

    pub fn to_block(&self) -> Block {
        match &self.behavior {
            ListenerBehavior::Redirect => Block::new("server")
                .directive("set", "$loc_in \"redir_to_ssl\"")
                .directive("set", "$loc_out \"redir_to_ssl\"")
                .directive("server_name", self.server_names.as_str())
                .directive("listen", self.kind.listen())
                // Always the first server name
                .directive("return", "301 https://$server_name$request_uri"),
            ListenerBehavior::Proxy { rules } => {
                let mut server = Block::new("server")
                    .directive("server_name", self.server_names.as_str())
                    .directive("proxy_set_header", "Host $host")
                    .directive("listen", self.kind.listen());

                if let Some(tls) = &self.tls {
                    server.extend([
                        Directive::new("ssl_certificate", tls.certificate.display().to_string()),
                        Directive::new(
                            "ssl_certificate_key",
                            tls.certificate_key.display().to_string(),
                        ),
                        Directive::new("ssl_ciphers", tls.ciphers.as_str()),
                    ]);
                }

                server.extend(rules.iter().map(Rule::to_block));
                server
            }
        }
    }
}
