//! Site routing compiler.
//!
//! Compiles declarative site descriptors into deterministic reverse-proxy
//! routing configuration, one artifact per deployment partition.

pub mod assembly;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod site;

pub use config::{load_inputs, CompilerInputs, EdgeConfig};
pub use error::{CompileError, DescriptorError, OutputError, PartitionError};
pub use pipeline::{compile_partition, RunReport};
pub use site::SiteDescriptor;
