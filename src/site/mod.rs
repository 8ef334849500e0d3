//! Site descriptor subsystem.
//!
//! # Data Flow
//! ```text
//! RawSite (config::schema, loose strings/integers)
//!     → config::validation (shape + referential checks)
//!     → SiteDescriptor (typed, immutable for the run)
//!     → rules / compiler (read-only)
//! ```
//!
//! # Design Decisions
//! - Unknown or missing fields are rejected at the load boundary
//! - Listener policies are enums; no string matching past validation
//! - Pattern sets iterate in canonical (sorted) order

pub mod certs;
pub mod descriptor;
pub mod policy;

pub use certs::CertificatePaths;
pub use descriptor::{CacheException, Origin, PathPattern, SiteDescriptor, SystemSite};
pub use policy::{HttpPolicy, HttpsPolicy};
