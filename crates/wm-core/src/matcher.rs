//! Rule Selection
//!
//! Picks the single best enabled rule for a page URL. Candidates are ranked
//! by score (higher first), then by their position in the rule list, so the
//! first enumerated rule wins ties.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::pattern::CompiledPattern;
use crate::types::Rule;

// =============================================================================
// Match Candidate
// =============================================================================

/// A rule that matched the URL, identified by its index in the rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    pub index: usize,
    pub score: i64,
}

impl Ord for MatchCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for MatchCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// =============================================================================
// Matcher
// =============================================================================

struct CacheEntry {
    source: String,
    compiled: Option<CompiledPattern>,
}

/// Rule matcher with a compiled-pattern cache keyed by rule id.
#[derive(Default)]
pub struct Matcher {
    cache: HashMap<String, CacheEntry>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one rule against `url`. Disabled rules and malformed patterns
    /// never match.
    pub fn score(&mut self, rule: &Rule, url: &str) -> Option<i64> {
        if !rule.enabled {
            return None;
        }
        self.compiled(rule)?.score(url)
    }

    /// Every matching rule, best first.
    pub fn candidates(&mut self, rules: &[Rule], url: &str) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                self.score(rule, url).map(|score| MatchCandidate { index, score })
            })
            .collect();
        candidates.sort();
        candidates
    }

    /// The best matching enabled rule, if any.
    pub fn select<'r>(&mut self, rules: &'r [Rule], url: &str) -> Option<&'r Rule> {
        let mut best: Option<MatchCandidate> = None;
        for (index, rule) in rules.iter().enumerate() {
            let Some(score) = self.score(rule, url) else {
                continue;
            };
            if best.map_or(true, |b| score > b.score) {
                best = Some(MatchCandidate { index, score });
            }
        }

        let best = best?;
        let rule = &rules[best.index];
        log::debug!("selected rule {} (score {}) for {}", rule.id, best.score, url);
        Some(rule)
    }

    /// Number of cached pattern entries.
    pub fn cached_patterns(&self) -> usize {
        self.cache.len()
    }

    fn compiled(&mut self, rule: &Rule) -> Option<&CompiledPattern> {
        let stale = self
            .cache
            .get(&rule.id)
            .map_or(true, |entry| entry.source != rule.url_pattern);

        if stale {
            let compiled = match CompiledPattern::compile(&rule.url_pattern) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    log::debug!("rule {} pattern {:?} ignored: {}", rule.id, rule.url_pattern, e);
                    None
                }
            };
            self.cache.insert(
                rule.id.clone(),
                CacheEntry {
                    source: rule.url_pattern.clone(),
                    compiled,
                },
            );
        }

        self.cache.get(&rule.id)?.compiled.as_ref()
    }
}

/// Select the best matching enabled rule without keeping a cache around.
pub fn select_rule<'r>(rules: &'r [Rule], url: &str) -> Option<&'r Rule> {
    Matcher::new().select(rules, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, pattern: &str) -> Rule {
        Rule::new(id, pattern)
    }

    #[test]
    fn exact_beats_wildcards_and_regex() {
        let rules = vec![
            rule("regex", "/example/"),
            rule("wild", "https://*.com/*"),
            rule("prefix", "https://example.com/*"),
            rule("exact", "https://example.com/page"),
        ];
        let selected = select_rule(&rules, "https://example.com/page").unwrap();
        assert_eq!(selected.id, "exact");
    }

    #[test]
    fn prefix_beats_wildcard_beats_regex() {
        let rules = vec![
            rule("regex", "/example/"),
            rule("wild", "https://*.example.com/*"),
        ];
        assert_eq!(select_rule(&rules, "https://a.example.com/x").unwrap().id, "wild");

        let rules = vec![rule("wild", "https://*.example.com/*"), rule("prefix", "https://a.example.com/*")];
        assert_eq!(select_rule(&rules, "https://a.example.com/x").unwrap().id, "prefix");
    }

    #[test]
    fn longer_literal_path_wins() {
        let rules = vec![
            rule("root", "https://example.com/*"),
            rule("docs", "https://example.com/docs/*"),
        ];
        let selected = select_rule(&rules, "https://example.com/docs/intro").unwrap();
        assert_eq!(selected.id, "docs");
    }

    #[test]
    fn first_rule_wins_ties() {
        let rules = vec![
            rule("first", "https://example.com/*"),
            rule("second", "https://example.com/*"),
        ];
        assert_eq!(select_rule(&rules, "https://example.com/a").unwrap().id, "first");
    }

    #[test]
    fn disabled_and_invalid_rules_are_skipped() {
        let mut disabled = rule("disabled", "https://example.com/page");
        disabled.enabled = false;
        let rules = vec![
            disabled,
            rule("broken", "/([a-z/"),
            rule("blank", "  "),
            rule("fallback", "/example/"),
        ];
        assert_eq!(select_rule(&rules, "https://example.com/page").unwrap().id, "fallback");
        assert!(select_rule(&rules, "https://other.org/").is_none());
    }

    #[test]
    fn candidates_are_ranked() {
        let rules = vec![
            rule("regex", "/example/"),
            rule("prefix-a", "https://example.com/*"),
            rule("exact", "https://example.com/a"),
            rule("prefix-b", "https://example.com/*"),
        ];
        let mut matcher = Matcher::new();
        let order: Vec<usize> = matcher
            .candidates(&rules, "https://example.com/a")
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }

    #[test]
    fn cache_recompiles_changed_patterns() {
        let mut matcher = Matcher::new();
        let mut r = rule("r", "https://example.com/*");
        assert!(matcher.score(&r, "https://example.com/x").is_some());
        assert_eq!(matcher.cached_patterns(), 1);

        r.url_pattern = "https://other.org/*".to_string();
        assert!(matcher.score(&r, "https://example.com/x").is_none());
        assert!(matcher.score(&r, "https://other.org/x").is_some());
        assert_eq!(matcher.cached_patterns(), 1);
    }
}
