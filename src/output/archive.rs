//! Deterministic tar archive of one partition.
//!
//! Entries are written from the in-memory bundle, not by walking the
//! directory, with fixed ownership, permissions and mtime so identical
//! bundles produce identical archives.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tar::{Builder, EntryType, Header};

use crate::error::OutputError;
use crate::output::PartitionBundle;

fn header(entry_type: EntryType, mode: u32, size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header
}

/// Write the bundle as a tar stream into `writer`.
pub fn write_tar<W: Write>(bundle: &PartitionBundle, writer: W) -> io::Result<W> {
    let mut builder = Builder::new(writer);

    for dir in PartitionBundle::dirs() {
        let mut h = header(EntryType::Directory, 0o755, 0);
        builder.append_data(&mut h, dir, io::empty())?;
    }
    for (path, contents) in bundle.files() {
        let mut h = header(EntryType::Regular, 0o644, contents.len() as u64);
        builder.append_data(&mut h, &path, contents.as_bytes())?;
    }

    builder.into_inner()
}

/// Write the archive to `path`.
pub fn write_archive(bundle: &PartitionBundle, path: &Path) -> Result<(), OutputError> {
    let file = File::create(path).map_err(OutputError::io(path))?;
    let file = write_tar(bundle, file).map_err(OutputError::io(path))?;
    file.sync_all().map_err(OutputError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Read;

    fn bundle() -> PartitionBundle {
        let mut sites = BTreeMap::new();
        sites.insert("example.org.conf".to_string(), "server {}\n".to_string());
        PartitionBundle {
            dnet: "dnet_a".into(),
            timestamp: "ts".into(),
            top_level: "events {}\n".into(),
            info: r#"{"config_version":"ts"}"#.into(),
            sites,
        }
    }

    #[test]
    fn test_archive_is_deterministic() {
        let a = write_tar(&bundle(), Vec::new()).unwrap();
        let b = write_tar(&bundle(), Vec::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_archive_contents() {
        let bytes = write_tar(&bundle(), Vec::new()).unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());

        let mut seen = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().display().to_string();
            if path == "info/info" {
                let mut s = String::new();
                entry.read_to_string(&mut s).unwrap();
                assert_eq!(s, r#"{"config_version":"ts"}"#);
            }
            seen.push(path);
        }

        assert!(seen.contains(&"nginx.conf".to_string()));
        assert!(seen.contains(&"sites.d/example.org.conf".to_string()));
        assert!(seen.iter().any(|p| p.trim_end_matches('/') == "sites.d"));
    }
}
