//! URL pattern compilation and scoring
//!
//! A rule's `urlPattern` is classified once into a [`UrlPattern`] variant and
//! scored against page URLs. Higher scores are more specific:
//!
//! | tier            | base | match                         |
//! |-----------------|------|-------------------------------|
//! | exact literal   | 400  | `url == pattern`              |
//! | suffix wildcard | 300  | `url.starts_with(prefix)`     |
//! | wildcard        | 200  | anchored `*` -> `.*` regex    |
//! | regex literal   | 100  | unanchored regex search       |
//!
//! Non-regex tiers add `pathLength + 10 * domainSpecificity`, and the wildcard
//! tiers subtract `5 * wildcardCount`.

use regex::Regex;

use crate::jsregex::JsRegex;
use crate::types::RegexFlags;
use crate::url::{domain_specificity, path_length, wildcard_count};

const EXACT_BASE: i64 = 400;
const PREFIX_BASE: i64 = 300;
const WILDCARD_BASE: i64 = 200;
const REGEX_SCORE: i64 = 100;

const WILDCARD_PENALTY: i64 = 5;
const DOMAIN_LABEL_WEIGHT: i64 = 10;

/// Error type for pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Empty pattern")]
    Empty,
    #[error("Invalid regex flags: {0}")]
    InvalidFlags(String),
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
}

/// Classified URL pattern.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// No wildcard: the URL must equal the pattern
    Exact(String),
    /// Single trailing `*`: the URL must start with the prefix
    Prefix(String),
    /// Any other `*` placement, compiled to an anchored regex
    Wildcard(Regex),
    /// `/source/flags` literal
    Regex(JsRegex),
}

/// A classified pattern together with its precomputed specificity bonus.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    kind: UrlPattern,
    base: i64,
    specificity: i64,
}

impl CompiledPattern {
    /// Classify and compile a raw `urlPattern`.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        if raw.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        if let Some((source, flags)) = split_regex_literal(raw) {
            let regex = compile_js_regex(source, flags)?;
            return Ok(Self {
                kind: UrlPattern::Regex(regex),
                base: REGEX_SCORE,
                specificity: 0,
            });
        }

        let wildcards = wildcard_count(raw) as i64;
        let bonus = path_length(raw) as i64 + DOMAIN_LABEL_WEIGHT * domain_specificity(raw) as i64;

        if wildcards == 0 {
            return Ok(Self {
                kind: UrlPattern::Exact(raw.to_string()),
                base: EXACT_BASE,
                specificity: bonus,
            });
        }

        let specificity = bonus - WILDCARD_PENALTY * wildcards;

        if wildcards == 1 && raw.ends_with('*') {
            return Ok(Self {
                kind: UrlPattern::Prefix(raw[..raw.len() - 1].to_string()),
                base: PREFIX_BASE,
                specificity,
            });
        }

        Ok(Self {
            kind: UrlPattern::Wildcard(compile_wildcard(raw)?),
            base: WILDCARD_BASE,
            specificity,
        })
    }

    pub fn kind(&self) -> &UrlPattern {
        &self.kind
    }

    /// Score `url` against this pattern, `None` when it does not match.
    pub fn score(&self, url: &str) -> Option<i64> {
        let matched = match &self.kind {
            UrlPattern::Exact(literal) => url == literal,
            UrlPattern::Prefix(prefix) => url.starts_with(prefix.as_str()),
            UrlPattern::Wildcard(regex) => regex.is_match(url),
            UrlPattern::Regex(regex) => regex.is_match(url),
        };
        matched.then_some(self.base + self.specificity)
    }
}

/// Split a `/source/flags` literal. Returns `None` for anything else.
pub fn split_regex_literal(raw: &str) -> Option<(&str, &str)> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix('/')?;
    let close = body.rfind('/')?;
    let (source, flags) = (&body[..close], &body[close + 1..]);
    if source.is_empty() || !flags.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some((source, flags))
}

/// Compile a JavaScript-style regex source with its flag string.
pub fn compile_js_regex(source: &str, flags: &str) -> Result<JsRegex, PatternError> {
    JsRegex::compile(source, RegexFlags::parse(flags)?)
}

/// Escape everything except `*`, which becomes "any run of characters".
fn compile_wildcard(raw: &str) -> Result<Regex, PatternError> {
    let body = raw
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|e| PatternError::InvalidRegex(e.to_string()))
}
