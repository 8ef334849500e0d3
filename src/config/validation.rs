//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Convert raw site records into typed descriptors
//! - Check referential integrity (sites reference declared partitions)
//! - Detect output collisions (two documents with the same file name)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function apart from the opt-in certificate check
//! - Runs before anything is compiled or written

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexSet;
use thiserror::Error;

use crate::config::schema::{EdgeConfig, RawSite, RawSystemSite, SiteCatalog};
use crate::error::DescriptorError;
use crate::rules::matcher::LocationMatch;
use crate::site::certs::CertificatePaths;
use crate::site::descriptor::{
    check_file_name, CacheException, Origin, PathPattern, SiteDescriptor, SystemSite,
};
use crate::site::policy::{HttpPolicy, HttpsPolicy};

/// A semantic problem in the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("config `{section}.{field}`: {reason}")]
    Config {
        section: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Typed sites of one catalog.
#[derive(Debug, Clone, Default)]
pub struct ValidatedSites {
    pub client: Vec<SiteDescriptor>,
    pub system: Vec<SystemSite>,
}

/// Validate the compiler configuration on its own.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut config_error = |section: &'static str, field: &'static str, reason: String| {
        errors.push(ValidationError::Config {
            section,
            field,
            reason,
        })
    };

    if config.deployment.dnets.is_empty() {
        config_error("deployment", "dnets", "at least one partition is required".into());
    }
    for dnet in &config.deployment.dnets {
        if let Err(reason) = check_file_name(dnet) {
            config_error("deployment", "dnets", reason);
        }
    }
    if config.deployment.ssl_ciphers.trim().is_empty() {
        config_error("deployment", "ssl_ciphers", "must not be empty".into());
    }
    if !config.auth.endpoint.path().ends_with('/') {
        config_error(
            "auth",
            "endpoint",
            format!("`{}` must end with `/`", config.auth.endpoint),
        );
    }
    if !config
        .auth
        .decision_cookie
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || config.auth.decision_cookie.is_empty()
    {
        config_error(
            "auth",
            "decision_cookie",
            format!("`{}` is not a valid cookie variable name", config.auth.decision_cookie),
        );
    }
    for path in &config.auth.diagnostic_paths {
        if let Err(reason) = PathPattern::parse(path) {
            config_error("auth", "diagnostic_paths", reason);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn port(site: &str, field: &str, value: i64, errors: &mut Vec<ValidationError>) -> u16 {
    match u16::try_from(value) {
        Ok(p) if p > 0 => p,
        _ => {
            errors.push(DescriptorError::new(site, field, format!("{value} is not a valid port")).into());
            0
        }
    }
}

fn minutes(site: &str, field: &str, value: i64, errors: &mut Vec<ValidationError>) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        errors.push(
            DescriptorError::new(site, field, format!("{value} is not a non-negative minute count")).into(),
        );
        0
    })
}

fn check_token(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ';' | '{' | '}' | '"' | '\'' | '#'))
    {
        return Err(format!("`{value}` contains whitespace or reserved characters"));
    }
    Ok(())
}

/// Convert one raw client site into a typed descriptor.
pub fn validate_site(
    name: &str,
    raw: &RawSite,
    config: &EdgeConfig,
) -> Result<SiteDescriptor, Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = Vec::new();
    let fail = |field: &str, reason: String, errors: &mut Vec<ValidationError>| {
        errors.push(DescriptorError::new(name, field, reason).into());
    };

    let http_request_does = raw
        .http_request_does
        .parse::<HttpPolicy>()
        .map_err(|e| fail("http_request_does", e.to_string(), &mut errors))
        .unwrap_or(HttpPolicy::Nothing);
    let https_request_does = raw
        .https_request_does
        .parse::<HttpsPolicy>()
        .map_err(|e| fail("https_request_does", e.to_string(), &mut errors))
        .unwrap_or(HttpsPolicy::Nothing);

    let mut server_names = IndexSet::new();
    for server_name in &raw.server_names {
        match check_token(server_name) {
            Ok(()) => {
                server_names.insert(server_name.clone());
            }
            Err(reason) => fail("server_names", reason, &mut errors),
        }
    }
    let any_listener = http_request_does.is_enabled() || https_request_does.is_enabled();
    if server_names.is_empty() && any_listener {
        fail(
            "server_names",
            "must not be empty when a listener is enabled".to_string(),
            &mut errors,
        );
    }

    if let Err(reason) = check_file_name(&raw.public_domain) {
        fail("public_domain", reason, &mut errors);
    }

    if !config.deployment.dnets.contains(&raw.dnet) {
        fail(
            "dnet",
            format!("`{}` is not a declared partition", raw.dnet),
            &mut errors,
        );
    }

    if let Err(reason) = check_token(&raw.origin_ip) {
        fail("origin_ip", reason, &mut errors);
    }
    let origin = Origin {
        ip: raw.origin_ip.clone(),
        http_port: port(name, "origin_http_port", raw.origin_http_port, &mut errors),
        https_port: port(name, "origin_https_port", raw.origin_https_port, &mut errors),
    };

    if let Some(bundle) = &raw.uploaded_cert_bundle_name {
        if bundle.trim().is_empty() {
            fail(
                "uploaded_cert_bundle_name",
                "must not be empty when present".to_string(),
                &mut errors,
            );
        }
    }

    let mut password_protected_paths = BTreeSet::new();
    for pattern in &raw.password_protected_paths {
        match PathPattern::parse(pattern) {
            Ok(p) => {
                password_protected_paths.insert(p);
            }
            Err(reason) => fail("password_protected_paths", reason, &mut errors),
        }
    }

    let mut cache_exceptions = BTreeSet::new();
    let mut ttl_by_regex: HashMap<&str, u32> = HashMap::new();
    for exc in &raw.cache_exceptions {
        let ttl = minutes(name, "cache_exceptions", exc.cache_time_minutes, &mut errors);
        match ttl_by_regex.insert(exc.location_regex.as_str(), ttl) {
            Some(previous) if previous != ttl => fail(
                "cache_exceptions",
                format!(
                    "`{}` is listed with conflicting TTLs ({previous} and {ttl})",
                    exc.location_regex
                ),
                &mut errors,
            ),
            _ => {}
        }
        match CacheException::parse(&exc.location_regex, ttl) {
            Ok(e) => {
                cache_exceptions.insert(e);
            }
            Err(reason) => fail("cache_exceptions", reason, &mut errors),
        }
    }

    let default_cache_time_minutes = minutes(
        name,
        "default_cache_time_minutes",
        raw.default_cache_time_minutes,
        &mut errors,
    );

    if !errors.is_empty() {
        return Err(errors);
    }

    let site = SiteDescriptor {
        name: name.to_string(),
        server_names,
        public_domain: raw.public_domain.clone(),
        dnet: raw.dnet.clone(),
        origin,
        uploaded_cert_bundle_name: raw.uploaded_cert_bundle_name.clone(),
        http_request_does,
        https_request_does,
        password_protected_paths,
        cache_exceptions,
        default_cache_time_minutes,
    };

    if config.certificates.require_present && site.has_encrypted_listener() {
        let paths = CertificatePaths::for_site(&site, &config.certificates);
        if let Err(reason) = paths.verify() {
            return Err(vec![DescriptorError::new(name, "certificate", reason).into()]);
        }
    }

    warn_on_overlap(&site);
    Ok(site)
}

/// Cache exceptions that also match a password-protected path (`/p` or
/// `/p/`). Precedence silently favours the password-protected rule there.
pub fn protected_overlaps(site: &SiteDescriptor) -> Vec<(&PathPattern, &CacheException)> {
    let mut overlaps = Vec::new();
    for pattern in &site.password_protected_paths {
        let path = match LocationMatch::for_protected_path(pattern) {
            LocationMatch::Exact(p) | LocationMatch::Prefix(p) => p,
            _ => continue,
        };
        for exc in &site.cache_exceptions {
            let cached = LocationMatch::CaseInsensitiveRegex(exc.location_regex.clone());
            if cached.matches_path(&path) {
                overlaps.push((pattern, exc));
            }
        }
    }
    overlaps
}

fn warn_on_overlap(site: &SiteDescriptor) {
    for (pattern, exc) in protected_overlaps(site) {
        tracing::warn!(
            site = %site.name,
            password_protected = %pattern,
            cache_exception = %exc.location_regex,
            "Cache exception overlaps a password-protected path; password protection wins"
        );
    }
}

fn validate_system_site(name: &str, raw: &RawSystemSite) -> Result<SystemSite, Vec<ValidationError>> {
    let mut errors = Vec::new();
    if let Err(reason) = check_file_name(name) {
        errors.push(DescriptorError::new(name, "name", reason).into());
    }
    if let Err(reason) = check_token(&raw.origin_ip) {
        errors.push(DescriptorError::new(name, "origin_ip", reason).into());
    }
    let origin_http_port = port(name, "origin_http_port", raw.origin_http_port, &mut errors);

    if errors.is_empty() {
        Ok(SystemSite {
            name: name.to_string(),
            origin_ip: raw.origin_ip.clone(),
            origin_http_port,
        })
    } else {
        Err(errors)
    }
}

/// Validate a whole catalog against the configuration.
pub fn validate_catalog(
    catalog: &SiteCatalog,
    config: &EdgeConfig,
) -> Result<ValidatedSites, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut validated = ValidatedSites::default();

    for (name, raw) in &catalog.client {
        match validate_site(name, raw, config) {
            Ok(site) => validated.client.push(site),
            Err(mut e) => errors.append(&mut e),
        }
    }
    for (name, raw) in &catalog.system {
        match validate_system_site(name, raw) {
            Ok(site) => validated.system.push(site),
            Err(mut e) => errors.append(&mut e),
        }
    }

    // Output file names within each partition's sites directory must be unique
    let mut claimed: BTreeMap<(&str, &str), &str> = BTreeMap::new();
    for site in &validated.client {
        if let Some(other) = claimed.insert((site.dnet.as_str(), site.public_domain.as_str()), site.name.as_str()) {
            errors.push(
                DescriptorError::new(
                    site.name.as_str(),
                    "public_domain",
                    format!(
                        "`{}` is already used by site `{other}` in partition `{}`",
                        site.public_domain, site.dnet
                    ),
                )
                .into(),
            );
        }
    }
    for system in &validated.system {
        if let Some(site) = validated.client.iter().find(|s| s.public_domain == system.name) {
            errors.push(
                DescriptorError::new(
                    system.name.as_str(),
                    "name",
                    format!("collides with the public domain of client site `{}`", site.name),
                )
                .into(),
            );
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(errors)
    }
}
