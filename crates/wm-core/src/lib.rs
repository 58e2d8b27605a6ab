//! WebMask Core Library
//!
//! This crate provides the rule matching and mask rendering engine for the
//! WebMask content script. It never touches the DOM directly: every page
//! operation goes through the [`PageHost`] trait, so the whole pipeline runs
//! the same way in the browser and in unit tests.
//!
//! # Pipeline
//!
//! stored rules -> [`Matcher`] (current URL) -> selected rule ->
//! [`collect_rects`] (content selectors) -> [`build_mask`] -> [`OverlayRenderer`],
//! with the selected rule also feeding the text rewriters.
//!
//! # Modules
//!
//! - `types`: Rule records and geometry primitives
//! - `url`: Pattern decomposition (host/path) and specificity metrics
//! - `jsregex`: Regex engine selection for JavaScript sources
//! - `pattern`: URL pattern compilation and scoring
//! - `matcher`: Best-rule selection with a compiled-pattern cache
//! - `substitution`: `/pattern/replacement/flags` expressions
//! - `geometry`: Selector to document-rect resolution
//! - `mask`: Clip path construction with rounded holes
//! - `overlay`: Overlay root, blocker paint and pre-ready hide
//! - `rewrite`: Title, content text and favicon rewriting
//! - `host`: The page abstraction the engine drives
//! - `controller`: Page lifecycle orchestration

pub mod types;
pub mod url;
pub mod jsregex;
pub mod pattern;
pub mod matcher;
pub mod substitution;
pub mod host;
pub mod geometry;
pub mod mask;
pub mod overlay;
pub mod rewrite;
pub mod controller;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use controller::PageController;
pub use geometry::collect_rects;
pub use host::{PageHost, Subscription};
pub use mask::{build_mask, MaskGeometry};
pub use matcher::{select_rule, MatchCandidate, Matcher};
pub use overlay::{BackdropFilter, OverlayRenderer, Paint};
pub use pattern::{CompiledPattern, PatternError, UrlPattern};
pub use substitution::{CompiledSubstitution, Substitution, SubstitutionError};
pub use types::{DocumentSize, Rect, RegexFlags, Rule, ScrollOffset, SelectorEntry, ViewportRect};
