//! Compilation pipeline.
//!
//! # Data Flow
//! ```text
//! CompilerInputs + generation timestamp
//!     → for each partition (in parallel, blocking pool):
//!         assembly::top_level → emit::render       → nginx.conf
//!         compiler::compile_site → emit::render    → sites.d/<domain>.conf
//!         output::system_sites                     → sites.d/<name>.conf
//!         output::info_json                        → info/info
//!         = PartitionBundle (in memory)
//!         → output::write_partition (staged, renamed into place)
//!     → RunReport (per-partition success / failure)
//! ```
//!
//! # Design Decisions
//! - One timestamp per run, shared by every artifact
//! - Partitions share nothing mutable and fail independently
//! - Compilation is synchronous; only the fan-out is async

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assembly;
use crate::compiler::compile_site;
use crate::config::loader::CompilerInputs;
use crate::emit;
use crate::error::{CompileError, PartitionError};
use crate::output::system_sites::SystemSiteRenderer;
use crate::output::{self, PartitionArtifact, PartitionBundle};
use crate::site::descriptor::check_file_name;

/// Format of the run-wide generation timestamp (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Timestamp for a new run.
pub fn generation_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A timestamp names the run directory and is quoted inside `/info`.
pub fn check_timestamp(timestamp: &str) -> Result<(), CompileError> {
    if timestamp == "." {
        return Err(CompileError::Timestamp("`.` is not usable as a file name".to_string()));
    }
    check_file_name(timestamp).map_err(CompileError::Timestamp)
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub timestamp: String,
    pub written: Vec<PartitionArtifact>,
    pub failed: Vec<(String, PartitionError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Render every file of one partition in memory.
pub fn compile_partition(
    inputs: &CompilerInputs,
    dnet: &str,
    timestamp: &str,
) -> Result<PartitionBundle, PartitionError> {
    check_timestamp(timestamp)?;
    let config = &inputs.config;
    let top_level = emit::render(&assembly::top_level(config, timestamp));

    let mut sites = BTreeMap::new();
    for site in inputs.sites.iter().filter(|s| s.dnet == dnet) {
        if !site.has_listeners() {
            tracing::info!(dnet, site = %site.name, "Site has no listeners; its document is empty");
        }
        let document = compile_site(site, config);
        tracing::debug!(
            dnet,
            site = %site.name,
            listeners = document.listeners.len(),
            "Site compiled"
        );
        sites.insert(
            format!("{}.conf", document.file_stem),
            emit::render(&document.to_document()),
        );
    }

    if let Some(first) = inputs.system_sites.first() {
        let template = inputs
            .system_template
            .as_deref()
            .ok_or_else(|| CompileError::MissingTemplate(first.name.clone()))?;
        let renderer = SystemSiteRenderer::new(template).map_err(|source| CompileError::Template {
            site: first.name.clone(),
            source,
        })?;
        for system in &inputs.system_sites {
            let rendered = renderer.render(system, &config.deployment.ssl_ciphers)?;
            sites.insert(format!("{}.conf", system.name), rendered);
        }
    }

    Ok(PartitionBundle {
        dnet: dnet.to_string(),
        timestamp: timestamp.to_string(),
        top_level,
        info: output::info_json(timestamp)?,
        sites,
    })
}

fn compile_and_write(
    inputs: &CompilerInputs,
    root: &Path,
    dnet: &str,
    timestamp: &str,
) -> Result<PartitionArtifact, PartitionError> {
    let bundle = compile_partition(inputs, dnet, timestamp)?;
    Ok(output::write_partition(root, &bundle)?)
}

/// Compile and write every partition concurrently.
pub async fn run(inputs: Arc<CompilerInputs>, root: PathBuf, timestamp: String) -> RunReport {
    let handles: Vec<_> = inputs
        .config
        .deployment
        .dnets
        .iter()
        .map(|dnet| {
            let inputs = Arc::clone(&inputs);
            let root = root.clone();
            let timestamp = timestamp.clone();
            let dnet = dnet.clone();
            let handle = tokio::task::spawn_blocking({
                let dnet = dnet.clone();
                move || compile_and_write(&inputs, &root, &dnet, &timestamp)
            });
            (dnet, handle)
        })
        .collect();

    let mut report = RunReport {
        timestamp: timestamp.clone(),
        ..RunReport::default()
    };

    for (dnet, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(PartitionError::Task(e.to_string())),
        };
        match result {
            Ok(artifact) => {
                tracing::info!(
                    dnet = %dnet,
                    dir = %artifact.dir.display(),
                    archive = %artifact.archive.display(),
                    "Partition written"
                );
                report.written.push(artifact);
            }
            Err(e) => {
                tracing::error!(dnet = %dnet, error = %e, "Partition failed");
                report.failed.push((dnet, e));
            }
        }
    }

    tracing::info!(
        timestamp = %report.timestamp,
        written = report.written.len(),
        failed = report.failed.len(),
        "Run complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let ts = generation_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
        assert!(check_timestamp(&ts).is_ok());
    }

    #[test]
    fn test_unsafe_timestamps_rejected() {
        for bad in ["", ".", "..", "2024\" ; evil", "../escape", "a/b", "a\\b", "with space"] {
            assert!(
                matches!(check_timestamp(bad), Err(CompileError::Timestamp(_))),
                "accepted {bad:?}"
            );
        }
        assert!(check_timestamp("release-7").is_ok());
    }
}
