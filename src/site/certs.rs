//! Certificate material locations.
//!
//! # Responsibilities
//! - Derive certificate chain and key paths from the public domain
//! - Optionally verify the material exists and parses as PEM
//!
//! # Design Decisions
//! - Sites without certificates are not a supported HTTP-only state
//! - Verification is opt-in; by default absence surfaces at the serving runtime

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::config::schema::CertificateConfig;
use crate::site::descriptor::SiteDescriptor;

/// Chain and key paths for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePaths {
    pub chain: PathBuf,
    pub key: PathBuf,
}

impl CertificatePaths {
    pub fn for_site(site: &SiteDescriptor, config: &CertificateConfig) -> Self {
        let domain = &site.public_domain;
        if site.uploaded_cert_bundle_name.is_some() {
            Self {
                chain: config.uploaded_root.join(format!("{domain}.cert-and-chain")),
                key: config.uploaded_root.join(format!("{domain}.key")),
            }
        } else {
            let dir = config.site_root.join(domain);
            Self {
                chain: dir.join("fullchain1.pem"),
                key: dir.join("privkey1.pem"),
            }
        }
    }

    /// Check that the chain holds at least one certificate and the key file a
    /// private key.
    pub fn verify(&self) -> Result<(), String> {
        let mut chain = open(&self.chain)?;
        let certs = rustls_pemfile::certs(&mut chain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("{}: {e}", self.chain.display()))?;
        if certs.is_empty() {
            return Err(format!("{}: no certificates found", self.chain.display()));
        }

        let mut key = open(&self.key)?;
        match rustls_pemfile::private_key(&mut key) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(format!("{}: no private key found", self.key.display())),
            Err(e) => Err(format!("{}: {e}", self.key.display())),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::descriptor::Origin;
    use crate::site::policy::{HttpPolicy, HttpsPolicy};

    fn site(bundle: Option<&str>) -> SiteDescriptor {
        SiteDescriptor {
            name: "example".into(),
            server_names: ["example.org".to_string()].into_iter().collect(),
            public_domain: "example.org".into(),
            dnet: "dnet_a".into(),
            origin: Origin {
                ip: "10.0.0.1".into(),
                http_port: 80,
                https_port: 443,
            },
            uploaded_cert_bundle_name: bundle.map(String::from),
            http_request_does: HttpPolicy::Redirect,
            https_request_does: HttpsPolicy::HttpsProxyPass,
            password_protected_paths: Default::default(),
            cache_exceptions: Default::default(),
            default_cache_time_minutes: 10,
        }
    }

    #[test]
    fn test_default_store_paths() {
        let paths = CertificatePaths::for_site(&site(None), &CertificateConfig::default());
        assert_eq!(paths.chain, PathBuf::from("/etc/ssl/sites/example.org/fullchain1.pem"));
        assert_eq!(paths.key, PathBuf::from("/etc/ssl/sites/example.org/privkey1.pem"));
    }

    #[test]
    fn test_uploaded_bundle_paths() {
        let paths = CertificatePaths::for_site(&site(Some("bundle")), &CertificateConfig::default());
        assert_eq!(paths.chain, PathBuf::from("/etc/ssl-uploaded/example.org.cert-and-chain"));
        assert_eq!(paths.key, PathBuf::from("/etc/ssl-uploaded/example.org.key"));
    }

    #[test]
    fn test_verify_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = CertificateConfig {
            site_root: dir.path().to_path_buf(),
            ..CertificateConfig::default()
        };
        let paths = CertificatePaths::for_site(&site(None), &config);
        let err = paths.verify().unwrap_err();
        assert!(err.contains("fullchain1.pem"));
    }

    #[test]
    fn test_verify_rejects_empty_chain() {
        let dir = tempfile::tempdir().unwrap();
        let site_dir = dir.path().join("example.org");
        std::fs::create_dir_all(&site_dir).unwrap();
        std::fs::write(site_dir.join("fullchain1.pem"), "not a pem file\n").unwrap();
        std::fs::write(site_dir.join("privkey1.pem"), "").unwrap();

        let config = CertificateConfig {
            site_root: dir.path().to_path_buf(),
            ..CertificateConfig::default()
        };
        let err = CertificatePaths::for_site(&site(None), &config)
            .verify()
            .unwrap_err();
        assert!(err.contains("no certificates found"));
    }
}
