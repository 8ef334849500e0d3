//! Global assembly.
//!
//! # Data Flow
//! ```text
//! EdgeConfig + generation timestamp
//!     → http.rs (log formats, cache zones, shared defaults)
//!     → servers.rs (catch-all, status, diagnostics, cache purge)
//!     → include of every per-site document
//!     → top-level Document (one per partition)
//! ```
//!
//! # Design Decisions
//! - Pure structural composition: no per-site decisions here
//! - Identical for every partition of a run; partitions differ only in
//!   which site documents sit next to it

pub mod http;
pub mod servers;

use crate::config::schema::EdgeConfig;
use crate::rules::tree::{Block, Directive, Document};

/// Build the top-level routing document.
pub fn top_level(config: &EdgeConfig, timestamp: &str) -> Document {
    let nginx = &config.nginx;
    let mut doc = Document::new();

    doc.push(Directive::new("load_module", nginx.cache_purge_module.as_str()));
    doc.push(Block::new("events").directive("worker_connections", nginx.worker_connections.to_string()));

    let mut http = Block::new("http");
    http.extend(http::preamble(nginx));
    http.push(servers::catch_all());
    http.push(servers::status(timestamp));
    http.push(servers::diagnostics(&config.auth));
    http.push(servers::cache_purge());
    http.push(Directive::new(
        "include",
        format!("{}/*.conf", nginx.sites_dir.trim_end_matches('/')),
    ));
    doc.push(http);

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EdgeConfig {
        toml::from_str(
            r#"
            [deployment]
            dnets = ["dnet_a"]
            ssl_ciphers = "HIGH"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_top_level_shape() {
        let doc = top_level(&config(), "ts");
        let names: Vec<_> = doc.blocks().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["events", "http"]);

        let http = doc.blocks().find(|b| b.name == "http").unwrap();
        let servers = http.blocks().filter(|b| b.name == "server").count();
        assert_eq!(servers, 4);
        assert_eq!(http.value("include"), Some("/etc/nginx/sites.d/*.conf"));
    }

    #[test]
    fn test_include_is_last() {
        let doc = top_level(&config(), "ts");
        let http = doc.blocks().find(|b| b.name == "http").unwrap();
        let last = http.children.last().unwrap();
        assert!(matches!(last, crate::rules::tree::Node::Directive(d) if d.name == "include"));
    }
}
