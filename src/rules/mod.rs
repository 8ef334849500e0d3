//! Rule model and fragment builders.
//!
//! # Data Flow
//! ```text
//! SiteDescriptor + FragmentContext (edge/origin encryption)
//!     → fragments.rs (one Rule per policy)
//!         → matcher.rs (location condition)
//!         → continuation.rs (failure transition → error_page)
//!         → auth.rs (authorization hand-off directives)
//!     → rule.rs (Rule → location Block)
//!     → tree.rs (Node / Block / Directive / Document)
//! ```
//!
//! # Design Decisions
//! - The continuation graph is data (transition tables), not label matching
//! - Builders are pure; ordering belongs to the compiler
//! - Directive values are pass-through strings

pub mod auth;
pub mod continuation;
pub mod fragments;
pub mod matcher;
pub mod rule;
pub mod tree;

pub use continuation::{Continuation, Transition};
pub use fragments::FragmentContext;
pub use matcher::LocationMatch;
pub use rule::{Rule, RuleKind};
pub use tree::{Block, Directive, Document, Node};
