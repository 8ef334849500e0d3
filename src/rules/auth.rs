//! Authorization hand-off.
//!
//! Every rule that needs a decision forwards the request metadata (never the
//! body) to the authorization service. The response is cached per client
//! address, host and decision cookie. Retries are left to the serving runtime.

use crate::config::schema::AuthConfig;
use crate::rules::tree::{Directive, Node};

/// Path on the authorization service that answers decision requests.
pub const AUTH_REQUEST_PATH: &str = "auth_request";

/// `proxy_pass` target for decision requests; the trailing `?` drops the
/// original query string.
pub fn auth_request_url(auth: &AuthConfig) -> String {
    format!("{}{}?", auth.endpoint, AUTH_REQUEST_PATH)
}

/// Cache key for decisions: `(client address, host, decision cookie)`.
pub fn decision_cache_key(auth: &AuthConfig) -> String {
    format!("\"$remote_addr $host $cookie_{}\"", auth.decision_cookie)
}

/// Directives handing the request to the authorization service.
pub fn hand_off(auth: &AuthConfig) -> Vec<Node> {
    vec![
        Directive::new("proxy_cache_key", decision_cache_key(auth)).into(),
        Directive::new("proxy_set_header", "X-Requested-Host $host").into(),
        Directive::new("proxy_set_header", "X-Client-IP $remote_addr").into(),
        Directive::new("proxy_set_header", "X-Requested-Path $request_uri").into(),
        Directive::new("proxy_pass_request_body", "off").into(),
        Directive::new("proxy_pass", auth_request_url(auth)).into(),
    ]
}
