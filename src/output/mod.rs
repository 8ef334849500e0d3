//! Output subsystem.
//!
//! # Data Flow
//! ```text
//! PartitionBundle (fully rendered, in memory)
//!     → staging.rs (write into a unique staging directory)
//!     → archive.rs (deterministic tar into a staging file)
//!     → staging.rs (rename both into place)
//!
//! Layout under <root>/<timestamp>/:
//!     etc-nginx-<dnet>/nginx.conf
//!     etc-nginx-<dnet>/info/info
//!     etc-nginx-<dnet>/sites.d/<public_domain|system name>.conf
//!     etc-nginx-<dnet>.tar
//! ```
//!
//! # Design Decisions
//! - Nothing touches disk until the whole partition is rendered
//! - The serving runtime never sees a half-written directory
//! - One partition's I/O failure does not affect the others

pub mod archive;
pub mod staging;
pub mod system_sites;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::OutputError;

pub use staging::{write_partition, PartitionArtifact};

pub const TOP_LEVEL_FILE: &str = "nginx.conf";
pub const INFO_DIR: &str = "info";
pub const INFO_FILE: &str = "info";
pub const SITES_DIR: &str = "sites.d";

/// Directory name of one partition's artifact.
pub fn partition_dir_name(dnet: &str) -> String {
    format!("etc-nginx-{dnet}")
}

#[derive(Serialize)]
struct InfoFile<'a> {
    config_version: &'a str,
}

/// `{"config_version":"<timestamp>"}`
pub fn info_json(timestamp: &str) -> Result<String, OutputError> {
    Ok(serde_json::to_string(&InfoFile {
        config_version: timestamp,
    })?)
}

/// Every file of one partition, rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionBundle {
    pub dnet: String,
    pub timestamp: String,
    pub top_level: String,
    pub info: String,
    /// File name (with `.conf`) → contents, for client and system sites.
    pub sites: BTreeMap<String, String>,
}

impl PartitionBundle {
    /// Relative paths and contents in archive order.
    pub fn files(&self) -> Vec<(String, &str)> {
        let mut files = vec![
            (TOP_LEVEL_FILE.to_string(), self.top_level.as_str()),
            (format!("{INFO_DIR}/{INFO_FILE}"), self.info.as_str()),
        ];
        files.extend(
            self.sites
                .iter()
                .map(|(name, contents)| (format!("{SITES_DIR}/{name}"), contents.as_str())),
        );
        files
    }

    /// Subdirectories that must exist even when empty.
    pub fn dirs() -> [&'static str; 2] {
        [INFO_DIR, SITES_DIR]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_json() {
        assert_eq!(
            info_json("2024-05-01_12:00:00").unwrap(),
            r#"{"config_version":"2024-05-01_12:00:00"}"#
        );
    }

    #[test]
    fn test_files_order() {
        let mut sites = BTreeMap::new();
        sites.insert("b.org.conf".to_string(), "b".to_string());
        sites.insert("a.org.conf".to_string(), "a".to_string());
        let bundle = PartitionBundle {
            dnet: "dnet_a".into(),
            timestamp: "ts".into(),
            top_level: "top".into(),
            info: "{}".into(),
            sites,
        };
        let paths: Vec<_> = bundle.files().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec!["nginx.conf", "info/info", "sites.d/a.org.conf", "sites.d/b.org.conf"]
        );
        assert_eq!(partition_dir_name("dnet_a"), "etc-nginx-dnet_a");
    }
}
