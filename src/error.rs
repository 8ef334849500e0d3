//! Error taxonomy.
//!
//! - [`DescriptorError`]: a site record is unusable; always names site and field
//! - [`CompileError`]: building a partition in memory failed
//! - [`OutputError`]: writing or archiving a partition failed
//! - [`PartitionError`]: either of the above, scoped to one partition
//!
//! Authorization failures at request time are not errors here; they are
//! routed through the fail-open / fail-closed continuations.

use std::path::PathBuf;

use thiserror::Error;

/// An invalid field in one site record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("site `{site}`: field `{field}`: {reason}")]
pub struct DescriptorError {
    pub site: String,
    pub field: String,
    pub reason: String,
}

impl DescriptorError {
    pub fn new(site: impl Into<String>, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure while building a partition bundle in memory.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The generation timestamp cannot name a directory or be quoted.
    #[error("invalid generation timestamp: {0}")]
    Timestamp(String),

    /// System sites exist but no template was configured.
    #[error("system site `{0}` requires `output.system_site_template`")]
    MissingTemplate(String),

    /// The system site template failed to render.
    #[error("rendering system site `{site}`: {source}")]
    Template {
        site: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Failure while writing a partition to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing info file: {0}")]
    Info(#[from] serde_json::Error),
}

impl OutputError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| OutputError::Io { path, source }
    }
}

/// Failure of one partition; other partitions are unaffected.
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Output(#[from] OutputError),

    /// The worker task panicked or was cancelled.
    #[error("partition task failed: {0}")]
    Task(String),
}
