use std::collections::HashSet;

use wm_core::Rule;

pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Keep the first rule for every id, preserving order.
pub fn dedupe_rules(rules: &mut Vec<Rule>) -> OptimizeStats {
    let before = rules.len();

    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped = 0usize;
    rules.retain(|rule| {
        if seen.contains(&rule.id) {
            log::warn!("dropping rule with duplicate id {}", rule.id);
            deduped += 1;
            false
        } else {
            seen.insert(rule.id.clone());
            true
        }
    });

    OptimizeStats {
        before,
        after: rules.len(),
        deduped,
    }
}
