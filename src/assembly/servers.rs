//! Fixed infrastructure listeners shared by every partition.

use crate::config::schema::AuthConfig;
use crate::rules::fragments::{AUTH_REQUESTS_CACHE, SITE_CONTENT_CACHE};
use crate::rules::tree::{Block, Directive};

/// Localhost-only access rules shared by the internal listeners.
fn localhost_only(server: Block) -> Block {
    server
        .directive("allow", "127.0.0.1")
        .directive("deny", "all")
        .directive("access_log", "off")
}

/// Rejects requests for hostnames no site claims, so the runtime never
/// falls back to an arbitrary site.
pub fn catch_all() -> Block {
    Block::new("server")
        .directive("listen", "80 default_server")
        .directive("listen", "443 ssl http2 default_server")
        .directive("listen", "[::]:80 default_server")
        .directive("listen", "[::]:443 ssl http2 default_server")
        .directive("server_name", "_")
        .directive("ssl_ciphers", "aNULL")
        .directive("ssl_certificate", "data:$empty")
        .directive("ssl_certificate_key", "data:$empty")
        .directive("return", "444")
}

/// `/info` reports the loaded config version, `/stub_status` connection
/// counts.
pub fn status(timestamp: &str) -> Block {
    let server = Block::new("server")
        .directive("listen", "80")
        .directive("server_name", "127.0.0.1");
    localhost_only(server)
        .child(Block::with_args("location", "/info").directive("return", format!("200 \"{timestamp}\\n\"")))
        .child(Block::with_args("location", "/stub_status").child(Directive::bare("stub_status")))
}

/// Exposes the authorization service's diagnostic endpoints.
pub fn diagnostics(auth: &AuthConfig) -> Block {
    let server = Block::new("server")
        .directive("listen", "80")
        .directive("server_name", auth.diagnostics_server_name.as_str());
    let mut server = localhost_only(server);
    for path in &auth.diagnostic_paths {
        server.push(
            Block::with_args("location", format!("/{path}"))
                .directive("proxy_pass", format!("{}{path}", auth.endpoint)),
        );
    }
    server
}

/// Purges entries from either cache zone by key.
pub fn cache_purge() -> Block {
    let server = Block::new("server")
        .directive("listen", "80")
        .directive("server_name", "\"cache_purge\"");
    localhost_only(server)
        .child(
            Block::with_args("location", "~ /auth_requests/(.*)")
                .directive("proxy_cache_purge", format!("{AUTH_REQUESTS_CACHE} $1")),
        )
        .child(
            Block::with_args("location", "~ /site_content/(.*)")
                .directive("proxy_cache_purge", format!("{SITE_CONTENT_CACHE} $1")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all_rejects() {
        let block = catch_all();
        assert_eq!(block.value("return"), Some("444"));
        assert_eq!(block.values("listen").count(), 4);
        assert_eq!(block.value("server_name"), Some("_"));
    }

    #[test]
    fn test_status_embeds_timestamp() {
        let block = status("2024-01-01_00:00:00");
        let info = block.blocks().next().unwrap();
        assert_eq!(info.value("return"), Some("200 \"2024-01-01_00:00:00\\n\""));
        assert_eq!(block.value("allow"), Some("127.0.0.1"));
    }

    #[test]
    fn test_diagnostics_proxy_to_auth_endpoint() {
        let block = diagnostics(&AuthConfig::default());
        let targets: Vec<_> = block
            .blocks()
            .map(|b| b.value("proxy_pass").unwrap().to_string())
            .collect();
        assert_eq!(
            targets,
            vec![
                "http://127.0.0.1:8081/info",
                "http://127.0.0.1:8081/decision_lists",
                "http://127.0.0.1:8081/rate_limit_states",
            ]
        );
        assert_eq!(block.value("deny"), Some("all"));
    }
}
