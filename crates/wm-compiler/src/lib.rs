//! WebMask Rule Compiler
//!
//! This crate turns the raw records kept in the synced rule store into
//! normalized [`Rule`](wm_core::Rule)s the core engine can match against.

pub mod id;
pub mod parser;
pub mod optimizer;
pub mod validate;

pub use optimizer::{dedupe_rules, OptimizeStats};
pub use parser::{
    normalize_rule, normalize_url_pattern, parse_rules_json, parse_stored_rules, CompileError,
    ParsedRules, STORAGE_KEY,
};
pub use validate::{validate_rules, Diagnostic, DiagnosticKind};
