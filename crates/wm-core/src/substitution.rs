//! Substitution expressions
//!
//! Text rewrites are stored as `/pattern/replacement/flags`. A `/` inside the
//! pattern or the replacement is escaped as `\/`; any other backslash
//! sequence is passed through untouched so regex escapes like `\d` survive.
//! Replacements use the `$&`, `$1`, `$<name>` and `$$` tokens.

use std::borrow::Cow;

use crate::jsregex::JsRegex;
use crate::pattern::PatternError;
use crate::types::RegexFlags;

/// Pattern used when an expression leaves the pattern empty.
const MATCH_EVERYTHING: &str = r"\A(?s:.*)\z";

/// Error type for substitution compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubstitutionError {
    #[error("Malformed substitution expression")]
    Malformed,
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A parsed, not yet compiled, substitution expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub flags: String,
}

impl Substitution {
    /// Parse `/pattern/replacement/flags`.
    ///
    /// Fails when the expression does not start with `/` or the delimiter
    /// closing the pattern is missing. A missing final delimiter leaves the
    /// flags empty.
    pub fn parse(expression: &str) -> Option<Self> {
        let body = expression.trim().strip_prefix('/')?;

        let (pattern, rest) = read_section(body);
        let rest = rest?;
        let (replacement, rest) = read_section(rest);
        let flags = rest.unwrap_or("").trim().to_string();

        Some(Self {
            pattern,
            replacement,
            flags,
        })
    }

    /// Compile, using `default_flags` when the expression carries none.
    pub fn compile(&self, default_flags: &str) -> Result<CompiledSubstitution, SubstitutionError> {
        let flags = if self.flags.is_empty() {
            default_flags
        } else {
            &self.flags
        };
        let flags = RegexFlags::parse(flags)?;

        let source = if self.pattern.is_empty() {
            MATCH_EVERYTHING
        } else {
            self.pattern.as_str()
        };

        let regex = JsRegex::compile(source, flags)?;

        let replacement = translate_replacement(&self.replacement, &regex);

        Ok(CompiledSubstitution {
            regex,
            replacement,
            global: flags.contains(RegexFlags::GLOBAL),
        })
    }
}

/// Parse and compile in one step; any failure yields `None`.
pub fn compile_expression(expression: &str, default_flags: &str) -> Option<CompiledSubstitution> {
    let parsed = match Substitution::parse(expression) {
        Some(parsed) => parsed,
        None => {
            log::warn!("ignoring malformed substitution {:?}", expression);
            return None;
        }
    };
    match parsed.compile(default_flags) {
        Ok(compiled) => Some(compiled),
        Err(e) => {
            log::warn!("ignoring substitution {:?}: {}", expression, e);
            None
        }
    }
}

/// A ready-to-apply substitution.
#[derive(Debug, Clone)]
pub struct CompiledSubstitution {
    regex: JsRegex,
    replacement: String,
    global: bool,
}

impl CompiledSubstitution {
    /// Replace the first match, or every match with the `g` flag.
    ///
    /// An empty match directly after a non-empty one is not replaced, so
    /// `/.*/X/g` turns `abc` into `X` where a browser gives `XX`.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let limit = if self.global { 0 } else { 1 };
        self.regex.replacen(text, limit, self.replacement.as_str())
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}

/// Read up to the next unescaped `/`. Returns the unescaped section and the
/// text after the delimiter, or `None` when no delimiter was found.
fn read_section(input: &str) -> (String, Option<&str>) {
    let mut section = String::new();
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, '/')) => section.push('/'),
                Some((_, other)) => {
                    section.push('\\');
                    section.push(other);
                }
                None => section.push('\\'),
            },
            '/' => return (section, Some(&input[i + 1..])),
            _ => section.push(c),
        }
    }

    (section, None)
}

/// Rewrite JS replacement tokens into the `regex` crate's syntax, escaping
/// every other `$`.
fn translate_replacement(replacement: &str, regex: &JsRegex) -> String {
    let group_count = regex.captures_len();
    let names = regex.group_names();
    let has_names = !names.is_empty();

    let mut out = String::with_capacity(replacement.len());
    let mut rest = replacement;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let bytes = tail.as_bytes();

        match bytes.first() {
            Some(b'$') => {
                out.push_str("$$");
                rest = &tail[1..];
            }
            Some(b'&') => {
                out.push_str("${0}");
                rest = &tail[1..];
            }
            Some(b'0'..=b'9') => {
                let one = (bytes[0] - b'0') as usize;
                let two = bytes
                    .get(1)
                    .filter(|b| b.is_ascii_digit())
                    .map(|b| one * 10 + (b - b'0') as usize);

                if let Some(two) = two.filter(|&n| n >= 1 && n < group_count) {
                    out.push_str(&format!("${{{two}}}"));
                    rest = &tail[2..];
                } else if one >= 1 && one < group_count {
                    out.push_str(&format!("${{{one}}}"));
                    rest = &tail[1..];
                } else {
                    out.push_str("$$");
                    rest = tail;
                }
            }
            Some(b'<') if has_names => match tail.find('>') {
                Some(end) => {
                    let name = &tail[1..end];
                    if names.contains(&name) {
                        out.push_str(&format!("${{{name}}}"));
                    }
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str("$$");
                    rest = tail;
                }
            },
            _ => {
                out.push_str("$$");
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(expression: &str, default_flags: &str, text: &str) -> String {
        compile_expression(expression, default_flags)
            .expect("expression should compile")
            .apply(text)
            .into_owned()
    }

    #[test]
    fn test_parse_basic() {
        let parsed = Substitution::parse("/foo/bar/g").unwrap();
        assert_eq!(parsed.pattern, "foo");
        assert_eq!(parsed.replacement, "bar");
        assert_eq!(parsed.flags, "g");
    }

    #[test]
    fn test_parse_escaped_slash() {
        let parsed = Substitution::parse("/a\\/b/c/").unwrap();
        assert_eq!(parsed.pattern, "a/b");
        assert_eq!(parsed.replacement, "c");
        assert_eq!(parsed.flags, "");
    }

    #[test]
    fn test_parse_failures() {
        assert!(Substitution::parse("foo/bar/g").is_none());
        assert!(Substitution::parse("/unterminated").is_none());
        assert!(Substitution::parse("").is_none());
    }

    #[test]
    fn test_parse_keeps_regex_escapes() {
        let parsed = Substitution::parse(r"/\d+/#/").unwrap();
        assert_eq!(parsed.pattern, r"\d+");
        assert_eq!(parsed.replacement, "#");
    }

    #[test]
    fn test_parse_missing_flags_delimiter() {
        let parsed = Substitution::parse("/foo/bar").unwrap();
        assert_eq!(parsed.replacement, "bar");
        assert_eq!(parsed.flags, "");
    }

    #[test]
    fn test_global_vs_single() {
        assert_eq!(apply("/a/x/g", "", "banana"), "bxnxnx");
        assert_eq!(apply("/a/x/", "", "banana"), "bxnana");
        // Default flags apply only when none are given
        assert_eq!(apply("/a/x/", "g", "banana"), "bxnxnx");
        assert_eq!(apply("/A/x/i", "g", "banana"), "bxnana");
    }

    #[test]
    fn test_backreference_and_lookaround() {
        assert_eq!(apply(r"/(\w)\1/<$1>/g", "", "aabcc"), "<a>b<c>");
        assert_eq!(apply(r"/\d+(?= unread)/N/", "", "3 unread, 12 total"), "N unread, 12 total");
    }

    #[test]
    fn test_global_empty_match_after_match_is_skipped() {
        let compiled = compile_expression("/.*/X/g", "").unwrap();
        assert!(compiled.is_global());
        assert_eq!(compiled.apply("abc"), "X");
        assert!(!compile_expression("/.*/X/", "").unwrap().is_global());
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert_eq!(apply("//Masked/", "", "Inbox (3) - Mail"), "Masked");
        assert_eq!(apply("//Masked/g", "", "Inbox"), "Masked");
    }

    #[test]
    fn test_replacement_tokens() {
        assert_eq!(apply(r"/(\w+)@(\w+)/$2 at $1/", "", "me@host"), "host at me");
        assert_eq!(apply("/b/[$&]/g", "", "abc"), "a[b]c");
        assert_eq!(apply("/b/$$/", "", "abc"), "a$c");
        assert_eq!(apply("/b/$9/", "", "abc"), "a$9c");
        assert_eq!(apply("/(?P<user>\\w+)@/$<user>:/", "", "me@x"), "me:x");
        assert_eq!(apply("/b/cost $5/", "", "b"), "cost $5");
    }

    #[test]
    fn test_invalid_expressions_are_ignored() {
        assert!(compile_expression("/(/x/", "g").is_none());
        assert!(compile_expression("/a/x/z", "g").is_none());
        assert!(compile_expression("nope", "g").is_none());
    }
}
