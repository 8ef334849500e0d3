//! Per-site compilation.
//!
//! Rule precedence within a proxied listener is fixed (first match wins):
//!
//! ```text
//! 1. password-protected paths   (sorted)
//! 2. cache exceptions           (sorted)
//! 3. static assets
//! 4. default `/`
//! 5. @access_denied, @access_granted, @fail_open, @fail_closed
//! ```

use crate::compiler::listener::{
    Listener, ListenerBehavior, ListenerKind, ListenerPlan, TlsSettings,
};
use crate::config::schema::EdgeConfig;
use crate::rules::continuation::Continuation;
use crate::rules::fragments::{self, FragmentContext};
use crate::rules::rule::Rule;
use crate::rules::tree::Document;
use crate::site::certs::CertificatePaths;
use crate::site::descriptor::SiteDescriptor;

/// Compiled listeners of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDocument {
    /// Output file stem (the public domain).
    pub file_stem: String,
    pub listeners: Vec<Listener>,
}

impl SiteDocument {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for listener in &self.listeners {
            doc.push(listener.to_block());
        }
        doc
    }

    pub fn listener(&self, kind: ListenerKind) -> Option<&Listener> {
        self.listeners.iter().find(|l| l.kind == kind)
    }
}

/// The full rule chain for one listener, in precedence order.
pub fn ordered_rules(ctx: &FragmentContext<'_>) -> Vec<Rule> {
    let site = ctx.site;
    let mut rules = Vec::with_capacity(
        site.password_protected_paths.len() + site.cache_exceptions.len() + 2 + Continuation::ORDERED.len(),
    );

    rules.extend(
        site.password_protected_paths
            .iter()
            .map(|p| fragments::password_protected(ctx, p)),
    );
    rules.extend(
        site.cache_exceptions
            .iter()
            .map(|e| fragments::cache_exception(ctx, e)),
    );
    rules.push(fragments::static_assets(ctx));
    rules.push(fragments::default_path(ctx));
    rules.extend(
        Continuation::ORDERED
            .iter()
            .map(|&c| fragments::continuation(ctx, c)),
    );
    rules
}

fn compile_listener(
    site: &SiteDescriptor,
    config: &EdgeConfig,
    kind: ListenerKind,
    plan: ListenerPlan,
) -> Option<Listener> {
    let behavior = match plan {
        ListenerPlan::Omit => return None,
        ListenerPlan::Redirect => ListenerBehavior::Redirect,
        ListenerPlan::Proxy { origin_encrypted } => {
            let ctx = FragmentContext {
                site,
                auth: &config.auth,
                origin_encrypted,
            };
            ListenerBehavior::Proxy {
                rules: ordered_rules(&ctx),
            }
        }
    };

    let tls = match &behavior {
        ListenerBehavior::Proxy { .. } if kind.is_encrypted() => {
            let paths = CertificatePaths::for_site(site, &config.certificates);
            Some(TlsSettings {
                certificate: paths.chain,
                certificate_key: paths.key,
                ciphers: config.deployment.ssl_ciphers.clone(),
            })
        }
        _ => None,
    };

    Some(Listener {
        kind,
        server_names: site.server_name_list(),
        tls,
        behavior,
    })
}

/// Compile one site: plaintext listener first, then encrypted.
pub fn compile_site(site: &SiteDescriptor, config: &EdgeConfig) -> SiteDocument {
    let listeners = [
        (
            ListenerKind::Plaintext,
            ListenerPlan::plaintext(site.http_request_does),
        ),
        (
            ListenerKind::Encrypted,
            ListenerPlan::encrypted(site.https_request_does),
        ),
    ]
    .into_iter()
    .filter_map(|(kind, plan)| compile_listener(site, config, kind, plan))
    .collect();

    SiteDocument {
        file_stem: site.public_domain.clone(),
        listeners,
    }
}
