//! JavaScript-flavored regular expressions
//!
//! Sources are compiled with `regex` first. When it rejects a source for
//! using lookaround or backreferences, the source is retried with
//! `fancy-regex`, which backtracks.

use std::borrow::Cow;

use crate::pattern::PatternError;
use crate::types::RegexFlags;

#[derive(Debug, Clone)]
pub enum JsRegex {
    /// Finite automaton engine
    Linear(regex::Regex),
    /// Backtracking engine for lookaround and backreferences
    Backtracking(fancy_regex::Regex),
}

impl JsRegex {
    pub fn compile(source: &str, flags: RegexFlags) -> Result<Self, PatternError> {
        let linear_err = match regex::RegexBuilder::new(source)
            .case_insensitive(flags.contains(RegexFlags::IGNORE_CASE))
            .multi_line(flags.contains(RegexFlags::MULTI_LINE))
            .dot_matches_new_line(flags.contains(RegexFlags::DOT_ALL))
            .build()
        {
            Ok(regex) => return Ok(Self::Linear(regex)),
            Err(e) => e,
        };

        let source = format!("{}{}", inline_flags(flags), unescape_slashes(source));
        match fancy_regex::Regex::new(&source) {
            Ok(regex) => Ok(Self::Backtracking(regex)),
            Err(e) => {
                log::debug!("backtracking engine rejected {:?}: {}", source, e);
                Err(PatternError::InvalidRegex(linear_err.to_string()))
            }
        }
    }

    pub fn is_backtracking(&self) -> bool {
        matches!(self, Self::Backtracking(_))
    }

    /// Unanchored search. A backtracking search that hits its step limit
    /// counts as no match.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Linear(regex) => regex.is_match(text),
            Self::Backtracking(regex) => regex.is_match(text).unwrap_or(false),
        }
    }

    /// Replace up to `limit` matches (0 = all). `replacement` uses `${n}` and
    /// `${name}` group references.
    pub fn replacen<'t>(&self, text: &'t str, limit: usize, replacement: &str) -> Cow<'t, str> {
        match self {
            Self::Linear(regex) => regex.replacen(text, limit, replacement),
            Self::Backtracking(regex) => regex
                .try_replacen(text, limit, replacement)
                .unwrap_or(Cow::Borrowed(text)),
        }
    }

    /// Number of groups, including the implicit whole-match group.
    pub fn captures_len(&self) -> usize {
        match self {
            Self::Linear(regex) => regex.captures_len(),
            Self::Backtracking(regex) => regex.captures_len(),
        }
    }

    pub fn group_names(&self) -> Vec<&str> {
        match self {
            Self::Linear(regex) => regex.capture_names().flatten().collect(),
            Self::Backtracking(regex) => regex.capture_names().flatten().collect(),
        }
    }
}

fn inline_flags(flags: RegexFlags) -> String {
    let mut inline = String::new();
    for (flag, c) in [
        (RegexFlags::IGNORE_CASE, 'i'),
        (RegexFlags::MULTI_LINE, 'm'),
        (RegexFlags::DOT_ALL, 's'),
    ] {
        if flags.contains(flag) {
            inline.push(c);
        }
    }
    if inline.is_empty() {
        inline
    } else {
        format!("(?{inline})")
    }
}

/// `\/` -> `/`; every other escape pair is kept.
fn unescape_slashes(source: &str) -> Cow<'_, str> {
    if !source.contains("\\/") {
        return Cow::Borrowed(source);
    }
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}
