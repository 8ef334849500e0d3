//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (dnet, site, path)
//!
//! Consumers:
//!     → logging.rs (fmt layer on stderr, filtered by EnvFilter)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted messages where possible
//! - Per-partition outcomes are always logged at info/error

pub mod logging;
