//! Per-site compiler.
//!
//! # Data Flow
//! ```text
//! SiteDescriptor
//!     → listener.rs (policy → Omit | Redirect | Proxy{origin_encrypted})
//!     → site.rs (fixed-precedence rule chain per proxied listener)
//!     → SiteDocument (0..2 server blocks)
//! ```
//!
//! # Design Decisions
//! - Two-level state machine: listener selector outside, continuation
//!   graph inside; only the wiring is emitted
//! - Deterministic: same descriptor always yields the same document

pub mod listener;
pub mod site;

pub use listener::{Listener, ListenerBehavior, ListenerKind, ListenerPlan};
pub use site::{compile_site, ordered_rules, SiteDocument};
