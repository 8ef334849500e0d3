//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use edge_compiler::config::schema::{RawCacheException, RawSite};
use edge_compiler::config::validation::validate_site;
use edge_compiler::{load_inputs, CompilerInputs, EdgeConfig, SiteDescriptor};

pub const TIMESTAMP: &str = "2024-05-01_12:00:00";

pub const EDGE_TOML: &str = r#"
[deployment]
dnets = ["dnet_a", "dnet_b"]
ssl_ciphers = "ECDHE-RSA-AES256-GCM-SHA512:HIGH:!aNULL"

[logging]
level = "debug"
"#;

/// A configuration with two partitions and default everything else.
pub fn config() -> EdgeConfig {
    toml::from_str(EDGE_TOML).unwrap()
}

/// The reference client site: redirect on plaintext, full chain on encrypted.
pub fn raw_site() -> RawSite {
    RawSite {
        server_names: vec!["example.org".into(), "www.example.org".into()],
        public_domain: "example.org".into(),
        dnet: "dnet_a".into(),
        origin_ip: "203.0.113.10".into(),
        origin_http_port: 80,
        origin_https_port: 443,
        uploaded_cert_bundle_name: None,
        http_request_does: "redirect".into(),
        https_request_does: "https_proxy_pass".into(),
        password_protected_paths: vec!["admin".into()],
        cache_exceptions: vec![],
        default_cache_time_minutes: 10,
    }
}

pub fn cache_exception(regex: &str, minutes: i64) -> RawCacheException {
    RawCacheException {
        location_regex: regex.into(),
        cache_time_minutes: minutes,
    }
}

/// Validate a raw site against [`config`], panicking on errors.
pub fn site(raw: &RawSite) -> SiteDescriptor {
    validate_site("example", raw, &config()).unwrap()
}

/// Write an input pair into `dir` and load it.
pub fn write_inputs(dir: &Path, edge: &str, sites: &str) -> (PathBuf, PathBuf) {
    let config_path = dir.join("edge.toml");
    let sites_path = dir.join("sites.toml");
    fs::write(&config_path, edge).unwrap();
    fs::write(&sites_path, sites).unwrap();
    (config_path, sites_path)
}

pub fn load(dir: &Path, edge: &str, sites: &str) -> CompilerInputs {
    let (config_path, sites_path) = write_inputs(dir, edge, sites);
    load_inputs(&config_path, &sites_path).unwrap()
}

/// Catalog with one client site per partition and one system site.
pub const SITES_TOML: &str = r#"
[client.example]
server_names = ["example.org", "www.example.org"]
public_domain = "example.org"
dnet = "dnet_a"
origin_ip = "203.0.113.10"
http_request_does = "redirect"
https_request_does = "https_proxy_pass"
password_protected_paths = ["admin"]
default_cache_time_minutes = 10

[client.news]
server_names = ["news.example.net"]
public_domain = "news.example.net"
dnet = "dnet_b"
origin_ip = "203.0.113.20"
origin_http_port = 8080
http_request_does = "http_proxy_pass"
https_request_does = "nothing"
default_cache_time_minutes = 5

[[client.news.cache_exceptions]]
location_regex = "^/feed"
cache_time_minutes = 1

[system.kibana]
origin_ip = "10.0.0.5"
origin_http_port = 5601
"#;

pub const SYSTEM_TEMPLATE: &str = "server {\n    server_name {{ server_name }};\n    ssl_ciphers {{ ssl_ciphers }};\n    proxy_pass {{ proxy_pass }};\n}\n";
