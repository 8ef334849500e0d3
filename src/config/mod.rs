//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! edge.toml + sites.toml
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, raw → typed descriptors)
//!     → CompilerInputs (validated, immutable for one run)
//!     → passed by value/reference into the pipeline
//!
//! In watch mode:
//!     watcher.rs detects change
//!     → loader.rs loads both files
//!     → validation.rs validates
//!     → new CompilerInputs sent to the run loop
//! ```
//!
//! # Design Decisions
//! - Inputs are immutable once loaded; changes require a full reload
//! - Everything except `[deployment]` has defaults
//! - Validation separates syntactic (serde) from semantic checks
//! - No process-wide state: configuration is threaded explicitly

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_inputs, CompilerInputs, ConfigError};
pub use schema::{AuthConfig, DeploymentConfig, EdgeConfig, SiteCatalog};
pub use validation::ValidationError;
