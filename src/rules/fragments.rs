//! Rule fragment builders.
//!
//! # Responsibilities
//! - One pure builder per policy: password-protected path, cache exception,
//!   static asset, default catch-all and the four named continuations
//! - Wire each rule's failure transition as an `error_page` directive
//! - Share the origin proxy body between every rule that serves origin
//!
//! # Design Decisions
//! - Builders never perform I/O and never mutate the descriptor
//! - Ordering is not decided here; see `compiler::site`

use crate::config::schema::AuthConfig;
use crate::rules::auth;
use crate::rules::continuation::Continuation;
use crate::rules::matcher::LocationMatch;
use crate::rules::rule::{Rule, RuleKind};
use crate::rules::tree::{Block, Directive, Node};
use crate::site::descriptor::{CacheException, PathPattern, SiteDescriptor};

/// Shared cache zone holding site content.
pub const SITE_CONTENT_CACHE: &str = "site_content_cache";

/// Shared cache zone holding authorization decisions.
pub const AUTH_REQUESTS_CACHE: &str = "auth_requests_cache";

/// Methods forwarded to origin; everything else is denied.
pub const ALLOWED_METHODS: &str =
    "GET POST PUT MKCOL COPY MOVE OPTIONS PROPFIND PROPPATCH LOCK UNLOCK PATCH";

/// Inputs shared by every builder for one listener.
#[derive(Debug, Clone, Copy)]
pub struct FragmentContext<'a> {
    pub site: &'a SiteDescriptor,
    pub auth: &'a AuthConfig,
    /// Proxy speaks TLS to origin.
    pub origin_encrypted: bool,
}

fn set_var(var: &str, value: &str) -> Node {
    Directive::new("set", format!("${var} \"{value}\"")).into()
}

/// Site-content cache directives with the given TTL.
pub fn content_cache(minutes: u32) -> Vec<Node> {
    vec![
        Directive::new("proxy_cache", SITE_CONTENT_CACHE).into(),
        Directive::new("proxy_cache_key", "\"$host $scheme $uri $is_args $args\"").into(),
        Directive::new("proxy_cache_valid", format!("any {minutes}m")).into(),
    ]
}

/// Body shared by every rule that serves the request from origin.
pub fn origin_proxy(ctx: &FragmentContext<'_>) -> Vec<Node> {
    let mut nodes = content_cache(ctx.site.default_cache_time_minutes);
    nodes.push(
        Block::with_args("limit_except", ALLOWED_METHODS)
            .directive("deny", "all")
            .into(),
    );
    nodes.extend([
        Directive::new("add_header", "X-Edge-Cache $upstream_cache_status"),
        Directive::new(
            "add_header",
            "X-Edge-Upstream-Response-Time $upstream_response_time",
        ),
        Directive::new("proxy_set_header", "X-Forwarded-For $proxy_add_x_forwarded_for"),
        Directive::new("proxy_set_header", "Host $host"),
        Directive::new("proxy_hide_header", "Upgrade"),
        Directive::new("proxy_ssl_name", "$host"),
        Directive::new("proxy_pass_request_body", "on"),
        Directive::new("proxy_pass", ctx.site.origin.url(ctx.origin_encrypted)),
    ]
    .into_iter()
    .map(Node::from));
    nodes
}

fn with_failure_transition(rule: &mut Rule) {
    if let Some(transition) = rule.kind.failure_transition() {
        rule.push(transition.to_directive());
    }
}

/// Authorization required, never cached, fails closed.
pub fn password_protected(ctx: &FragmentContext<'_>, pattern: &PathPattern) -> Rule {
    let kind = RuleKind::PasswordProtected;
    let mut rule = Rule::new(kind, LocationMatch::for_protected_path(pattern));
    rule.push(set_var("loc_in", kind.log_label()));
    rule.push(Directive::new("proxy_cache_valid", "0"));
    with_failure_transition(&mut rule);
    rule.extend(auth::hand_off(ctx.auth));
    rule
}

/// Cached with the exception's own TTL, served as granted on failure.
pub fn cache_exception(ctx: &FragmentContext<'_>, exception: &CacheException) -> Rule {
    let kind = RuleKind::CacheException;
    let mut rule = Rule::new(
        kind,
        LocationMatch::CaseInsensitiveRegex(exception.location_regex.clone()),
    );
    rule.push(set_var("loc_in", kind.log_label()));
    rule.extend(content_cache(exception.cache_time_minutes));
    with_failure_transition(&mut rule);
    rule.extend(auth::hand_off(ctx.auth));
    rule
}

/// Static files go straight to origin with the default TTL.
pub fn static_assets(ctx: &FragmentContext<'_>) -> Rule {
    let kind = RuleKind::StaticAsset;
    let mut rule = Rule::new(kind, LocationMatch::static_assets());
    rule.push(set_var("loc_in", kind.log_label()));
    rule.push(set_var("loc_out", kind.log_label()));
    rule.extend(origin_proxy(ctx));
    rule
}

/// Catch-all `/`: authorization required, no caching, fails open.
pub fn default_path(ctx: &FragmentContext<'_>) -> Rule {
    let kind = RuleKind::Default;
    let mut rule = Rule::new(kind, LocationMatch::catch_all());
    rule.push(set_var("loc_in", kind.log_label()));
    with_failure_transition(&mut rule);
    rule.extend(auth::hand_off(ctx.auth));
    rule
}

/// Named continuation block.
pub fn continuation(ctx: &FragmentContext<'_>, target: Continuation) -> Rule {
    let mut rule = Rule::new(RuleKind::Continuation(target), LocationMatch::Named(target));
    rule.push(set_var("loc_out", target.name()));
    match target {
        Continuation::AccessDenied => {
            rule.push(Directive::new("return", "403 \"access denied\""));
        }
        Continuation::FailClosed => {
            rule.push(Directive::new(
                "return",
                "500 \"error talking to the authorization service, failing closed\"",
            ));
        }
        Continuation::AccessGranted | Continuation::FailOpen => {
            rule.extend(origin_proxy(ctx));
        }
    }
    rule
}
