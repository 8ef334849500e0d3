//! Staged, rename-into-place partition writes.
//!
//! # Responsibilities
//! - Write a bundle into a uniquely named staging directory
//! - Archive it into a staging file
//! - Swap both into their final names, replacing any previous artifact
//! - Remove staging leftovers on failure
//!
//! # Design Decisions
//! - A previous artifact is moved aside, not deleted, until the new one is in place
//! - Concurrent writers to the same partition are not supported; callers serialize

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::OutputError;
use crate::output::{archive, partition_dir_name, PartitionBundle};

/// Where a partition ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionArtifact {
    pub dnet: String,
    pub dir: PathBuf,
    pub archive: PathBuf,
}

fn write_tree(dir: &Path, bundle: &PartitionBundle) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(OutputError::io(dir))?;
    for sub in PartitionBundle::dirs() {
        let path = dir.join(sub);
        fs::create_dir_all(&path).map_err(OutputError::io(&path))?;
    }
    for (relative, contents) in bundle.files() {
        let path = dir.join(relative);
        fs::write(&path, contents).map_err(OutputError::io(&path))?;
    }
    Ok(())
}

/// Put the staged directory in place, moving any previous one to `aside`.
///
/// Returns whether a previous directory was moved aside.
fn swap_dir(staged: &Path, target: &Path, aside: &Path) -> Result<bool, OutputError> {
    let had_previous = target.exists();
    if had_previous {
        fs::rename(target, aside).map_err(OutputError::io(target))?;
    }

    if let Err(e) = fs::rename(staged, target) {
        if had_previous {
            restore_dir(target, aside);
        }
        return Err(OutputError::Io {
            path: target.to_path_buf(),
            source: e,
        });
    }
    Ok(had_previous)
}

/// Drop whatever is at `target` and move `aside` back.
fn restore_dir(target: &Path, aside: &Path) {
    if target.exists() {
        if let Err(e) = fs::remove_dir_all(target) {
            tracing::error!(path = %target.display(), error = %e, "Failed to remove new artifact");
            return;
        }
    }
    if let Err(e) = fs::rename(aside, target) {
        tracing::error!(
            path = %target.display(),
            error = %e,
            "Failed to restore previous artifact"
        );
    }
}

/// Commit the directory, then the archive. A failed archive rename leaves
/// the previous archive untouched, so the directory is rolled back to match.
fn stage_and_swap(
    bundle: &PartitionBundle,
    staging_dir: &Path,
    staging_tar: &Path,
    final_dir: &Path,
    final_tar: &Path,
    aside: &Path,
) -> Result<(), OutputError> {
    write_tree(staging_dir, bundle)?;
    archive::write_archive(bundle, staging_tar)?;
    let had_previous = swap_dir(staging_dir, final_dir, aside)?;

    if let Err(e) = fs::rename(staging_tar, final_tar) {
        if had_previous {
            restore_dir(final_dir, aside);
        } else if let Err(cleanup) = fs::remove_dir_all(final_dir) {
            tracing::error!(path = %final_dir.display(), error = %cleanup, "Failed to remove new artifact");
        }
        return Err(OutputError::Io {
            path: final_tar.to_path_buf(),
            source: e,
        });
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(aside) {
            tracing::warn!(path = %aside.display(), error = %e, "Failed to remove previous artifact");
        }
    }
    Ok(())
}

/// Write one partition under `<root>/<timestamp>/`.
pub fn write_partition(root: &Path, bundle: &PartitionBundle) -> Result<PartitionArtifact, OutputError> {
    let run_dir = root.join(&bundle.timestamp);
    fs::create_dir_all(&run_dir).map_err(OutputError::io(&run_dir))?;

    let name = partition_dir_name(&bundle.dnet);
    let token = Uuid::new_v4().simple();
    let staging_dir = run_dir.join(format!(".{name}.{token}.staging"));
    let staging_tar = run_dir.join(format!(".{name}.{token}.tar.staging"));
    let aside = run_dir.join(format!(".{name}.{token}.old"));
    let final_dir = run_dir.join(&name);
    let final_tar = run_dir.join(format!("{name}.tar"));

    let result = stage_and_swap(bundle, &staging_dir, &staging_tar, &final_dir, &final_tar, &aside);
    if result.is_err() {
        // Best effort; the error that matters is the one returned
        let _ = fs::remove_dir_all(&staging_dir);
        let _ = fs::remove_file(&staging_tar);
    }
    result?;

    tracing::debug!(dnet = %bundle.dnet, dir = %final_dir.display(), "Partition written");
    Ok(PartitionArtifact {
        dnet: bundle.dnet.clone(),
        dir: final_dir,
        archive: final_tar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn bundle(site_body: &str) -> PartitionBundle {
        let mut sites = BTreeMap::new();
        sites.insert("example.org.conf".to_string(), site_body.to_string());
        PartitionBundle {
            dnet: "dnet_a".into(),
            timestamp: "2024-05-01_12:00:00".into(),
            top_level: "events {}\n".into(),
            info: r#"{"config_version":"2024-05-01_12:00:00"}"#.into(),
            sites,
        }
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with('.'))
            .collect()
    }

    #[test]
    fn test_write_layout() {
        let root = tempfile::tempdir().unwrap();
        let artifact = write_partition(root.path(), &bundle("server {}\n")).unwrap();

        assert_eq!(
            artifact.dir,
            root.path().join("2024-05-01_12:00:00").join("etc-nginx-dnet_a")
        );
        assert!(artifact.dir.join("nginx.conf").is_file());
        assert!(artifact.dir.join("info").join("info").is_file());
        assert!(artifact.dir.join("sites.d").join("example.org.conf").is_file());
        assert!(artifact.archive.is_file());
        assert!(leftovers(&root.path().join("2024-05-01_12:00:00")).is_empty());
    }

    #[test]
    fn test_rewrite_replaces_previous_artifact() {
        let root = tempfile::tempdir().unwrap();
        write_partition(root.path(), &bundle("old\n")).unwrap();

        let mut next = bundle("new\n");
        next.sites.insert("other.org.conf".into(), "x\n".into());
        next.sites.remove("example.org.conf");
        let artifact = write_partition(root.path(), &next).unwrap();

        assert!(!artifact.dir.join("sites.d").join("example.org.conf").exists());
        assert_eq!(
            fs::read_to_string(artifact.dir.join("sites.d").join("other.org.conf")).unwrap(),
            "x\n"
        );
        assert!(leftovers(&root.path().join("2024-05-01_12:00:00")).is_empty());
    }

    #[test]
    fn test_failed_archive_rename_keeps_previous_artifact() {
        let root = tempfile::tempdir().unwrap();
        let first = write_partition(root.path(), &bundle("old\n")).unwrap();
        let run_dir = root.path().join("2024-05-01_12:00:00");

        // Occupy the archive path with a directory so the rename fails
        fs::remove_file(&first.archive).unwrap();
        fs::create_dir(&first.archive).unwrap();
        fs::write(first.archive.join("keep"), "x").unwrap();

        let err = write_partition(root.path(), &bundle("new\n")).unwrap_err();
        assert!(matches!(err, OutputError::Io { ref path, .. } if path == &first.archive));
        assert_eq!(
            fs::read_to_string(first.dir.join("sites.d").join("example.org.conf")).unwrap(),
            "old\n"
        );
        assert!(first.archive.join("keep").is_file());
        assert!(leftovers(&run_dir).is_empty());
    }

    #[test]
    fn test_failed_first_write_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let run_dir = root.path().join("2024-05-01_12:00:00");
        fs::create_dir_all(run_dir.join("etc-nginx-dnet_a.tar")).unwrap();

        assert!(write_partition(root.path(), &bundle("x\n")).is_err());
        assert!(!run_dir.join("etc-nginx-dnet_a").exists());
        assert!(leftovers(&run_dir).is_empty());
    }

    #[test]
    fn test_unwritable_root_fails_cleanly() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_partition(&blocker, &bundle("x\n")).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }
}
