//! Configuration schema definitions.
//!
//! Two files feed a compilation run:
//! - the compiler configuration ([`EdgeConfig`]): partitions, cipher policy,
//!   authorization endpoint, output layout and serving-runtime constants
//! - the site catalog ([`SiteCatalog`]): raw client and system site records
//!
//! All types derive Serde traits for deserialization from TOML. Site records
//! are deliberately loose here (policies as strings, integers as `i64`);
//! `validation.rs` turns them into typed descriptors and names the offending
//! site and field on failure.

use std::collections::BTreeSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Root compiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeConfig {
    /// Partitions and cipher policy. Required.
    pub deployment: DeploymentConfig,

    /// Authorization service hand-off.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Where artifacts are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Serving-runtime constants for the top-level document.
    #[serde(default)]
    pub nginx: NginxConfig,

    /// Certificate locations and checks.
    #[serde(default)]
    pub certificates: CertificateConfig,

    /// Logging settings for the binary.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deployment-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeploymentConfig {
    /// Deployment partitions; each gets its own artifact.
    pub dnets: BTreeSet<String>,

    /// Cipher policy applied to every encrypted listener.
    pub ssl_ciphers: String,
}

/// Authorization service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the authorization service (must end with `/`).
    pub endpoint: Url,

    /// Cookie carrying the authorization decision; part of the cache key.
    pub decision_cookie: String,

    /// `server_name` of the diagnostic listener.
    pub diagnostics_server_name: String,

    /// Paths proxied verbatim to the service by the diagnostic listener.
    pub diagnostic_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse("http://127.0.0.1:8081/").expect("static URL is valid"),
            decision_cookie: "deflect_challenge".to_string(),
            diagnostics_server_name: "auth_service".to_string(),
            diagnostic_paths: vec![
                "info".to_string(),
                "decision_lists".to_string(),
                "rate_limit_states".to_string(),
            ],
        }
    }
}

/// Output layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; each run writes `<root>/<timestamp>/`.
    pub root: PathBuf,

    /// Template used for system sites.
    pub system_site_template: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("output"),
            system_site_template: None,
        }
    }
}

/// Constants of the serving runtime's top-level document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Dynamic module providing cache purge support.
    pub cache_purge_module: String,

    pub worker_connections: u32,

    pub server_names_hash_bucket_size: u32,

    pub client_max_body_size: String,

    /// Cache zone for authorization decisions.
    pub auth_cache_path: String,

    /// Cache zone for site content.
    pub content_cache_path: String,

    pub content_cache_max_size: String,

    /// Directory holding the access logs.
    pub log_dir: String,

    /// Directory the per-site documents are installed into.
    pub sites_dir: String,
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            cache_purge_module: "/usr/lib/nginx/modules/ngx_http_cache_purge_module_torden.so"
                .to_string(),
            worker_connections: 1024,
            server_names_hash_bucket_size: 128,
            client_max_body_size: "2G".to_string(),
            auth_cache_path: "/data/nginx/auth_requests_cache".to_string(),
            content_cache_path: "/data/nginx/site_content_cache".to_string(),
            content_cache_max_size: "50g".to_string(),
            log_dir: "/var/log/nginx".to_string(),
            sites_dir: "/etc/nginx/sites.d".to_string(),
        }
    }
}

/// Certificate locations on the serving host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Per-domain store: `<site_root>/<domain>/fullchain1.pem`.
    pub site_root: PathBuf,

    /// Uploaded bundles: `<uploaded_root>/<domain>.cert-and-chain`.
    pub uploaded_root: PathBuf,

    /// Fail the run when a site's certificate material is missing.
    pub require_present: bool,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            site_root: PathBuf::from("/etc/ssl/sites"),
            uploaded_root: PathBuf::from("/etc/ssl-uploaded"),
            require_present: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Site catalog: two named groups.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteCatalog {
    pub client: IndexMap<String, RawSite>,
    pub system: IndexMap<String, RawSystemSite>,
}

/// A client site as written in the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawSite {
    pub server_names: Vec<String>,
    pub public_domain: String,
    pub dnet: String,
    pub origin_ip: String,
    #[serde(default = "default_http_port")]
    pub origin_http_port: i64,
    #[serde(default = "default_https_port")]
    pub origin_https_port: i64,
    #[serde(default)]
    pub uploaded_cert_bundle_name: Option<String>,
    pub http_request_does: String,
    pub https_request_does: String,
    #[serde(default)]
    pub password_protected_paths: Vec<String>,
    #[serde(default)]
    pub cache_exceptions: Vec<RawCacheException>,
    pub default_cache_time_minutes: i64,
}

/// A cache exception as written in the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawCacheException {
    pub location_regex: String,
    pub cache_time_minutes: i64,
}

/// A system site as written in the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawSystemSite {
    pub origin_ip: String,
    #[serde(default = "default_http_port")]
    pub origin_http_port: i64,
}

fn default_http_port() -> i64 {
    80
}

fn default_https_port() -> i64 {
    443
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: EdgeConfig = toml::from_str(
            r#"
            [deployment]
            dnets = ["dnet_b", "dnet_a"]
            ssl_ciphers = "HIGH:!aNULL"
            "#,
        )
        .unwrap();

        let dnets: Vec<_> = config.deployment.dnets.iter().cloned().collect();
        assert_eq!(dnets, vec!["dnet_a", "dnet_b"]);
        assert_eq!(config.auth.endpoint.as_str(), "http://127.0.0.1:8081/");
        assert_eq!(config.nginx.worker_connections, 1024);
        assert!(!config.certificates.require_present);
    }

    #[test]
    fn test_catalog_rejects_unknown_site_fields() {
        let result: Result<SiteCatalog, _> = toml::from_str(
            r#"
            [client.example]
            server_names = ["example.org"]
            public_domain = "example.org"
            dnet = "dnet_a"
            origin_ip = "10.0.0.1"
            http_request_does = "redirect"
            https_request_does = "https_proxy_pass"
            default_cache_time_minutes = 10
            surprise = true
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_keeps_document_order() {
        let catalog: SiteCatalog = toml::from_str(
            r#"
            [system.zeta]
            origin_ip = "10.0.0.9"

            [system.alpha]
            origin_ip = "10.0.0.8"
            origin_http_port = 8080
            "#,
        )
        .unwrap();

        let names: Vec<_> = catalog.system.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(catalog.system["zeta"].origin_http_port, 80);
    }
}
