#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Evidence attribution for structured lecture outlines.
//!
//! Every concept proposed by the structuring stage is linked back to a
//! verbatim quote of the extracted document text when one can be found, and
//! otherwise keeps the model's own description. The crate is pure: no I/O,
//! no shared state, deterministic for a fixed input.

/// Term normalization and token splitting.
#[path = "../normalizer.rs"]
pub mod normalizer;

/// Case-insensitive anchor search with line-snapped quote windows.
#[path = "../anchor.rs"]
pub mod anchor;

/// Typed outline produced at the structuring boundary.
#[path = "../outline.rs"]
pub mod outline;

/// Outline-wide evidence attribution.
#[path = "../attribution.rs"]
pub mod attribution;

pub use anchor::{locate, Anchor, MatchKind, QuoteWindow, SourceIndex};
pub use attribution::{
    attribute, AnnotatedModule, AnnotatedOutline, Attribution, AttributionReport,
    ConceptWithEvidence, Definition, DefinitionSource, Evidence, SourceLocation,
};
pub use normalizer::{normalize_term, normalize_text, split_tokens};
pub use outline::{ConceptCandidate, ModuleCandidate, OutlineDefaults, StructuredOutline};
