//! Rule set diagnostics
//!
//! The content script silently ignores anything malformed. This pass reports
//! those problems so they can be fixed in the options page.

use std::fmt;

use wm_core::pattern::CompiledPattern;
use wm_core::rewrite::CONTENT_DEFAULT_FLAGS;
use wm_core::types::MAX_EFFECT_LEVEL;
use wm_core::{Rule, Substitution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The URL pattern can never match
    UrlPattern(String),
    /// The title expression is ignored
    TitleExpression(String),
    /// A content selector's expression is ignored
    ContentExpression { selector: String, reason: String },
    /// A level will be clamped at render time
    LevelOutOfRange { field: &'static str, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule_id: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UrlPattern(reason) => {
                write!(f, "[{}] url pattern never matches: {}", self.rule_id, reason)
            }
            DiagnosticKind::TitleExpression(reason) => {
                write!(f, "[{}] title expression ignored: {}", self.rule_id, reason)
            }
            DiagnosticKind::ContentExpression { selector, reason } => {
                write!(f, "[{}] expression on {:?} ignored: {}", self.rule_id, selector, reason)
            }
            DiagnosticKind::LevelOutOfRange { field, value } => {
                write!(f, "[{}] {} {} clamped to [0, {}]", self.rule_id, field, value, MAX_EFFECT_LEVEL)
            }
        }
    }
}

/// Report every pattern, expression and level problem in `rules`.
pub fn validate_rules(rules: &[Rule]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for rule in rules {
        let mut report = |kind| {
            diagnostics.push(Diagnostic {
                rule_id: rule.id.clone(),
                kind,
            })
        };

        if let Err(e) = CompiledPattern::compile(&rule.url_pattern) {
            report(DiagnosticKind::UrlPattern(e.to_string()));
        }

        if let Some(expression) = rule.title_expression() {
            if let Err(reason) = check_expression(expression, "") {
                report(DiagnosticKind::TitleExpression(reason));
            }
        }

        for entry in rule.selector_entries() {
            let Some(expression) = entry.expression else {
                continue;
            };
            if let Err(reason) = check_expression(expression, CONTENT_DEFAULT_FLAGS) {
                report(DiagnosticKind::ContentExpression {
                    selector: entry.selector.to_string(),
                    reason,
                });
            }
        }

        for (field, value) in [
            ("frostedLevel", rule.frosted_level),
            ("desaturateLevel", rule.desaturate_level),
        ] {
            if !(0..=MAX_EFFECT_LEVEL).contains(&value) {
                report(DiagnosticKind::LevelOutOfRange { field, value });
            }
        }
    }

    diagnostics
}

fn check_expression(expression: &str, default_flags: &str) -> Result<(), String> {
    let parsed = Substitution::parse(expression).ok_or_else(|| "malformed expression".to_string())?;
    parsed
        .compile(default_flags)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_rule_has_no_diagnostics() {
        let mut rule = Rule::new("ok", "https://example.com/*");
        rule.title_mask_expression = Some("/.*/Notes/".to_string());
        rule.content_selectors = vec!["#main#/a/b/".to_string()];
        assert!(validate_rules(&[rule]).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let mut rule = Rule::new("bad", "/(/");
        rule.title_mask_expression = Some("Notes".to_string());
        rule.content_selectors = vec!["#main#/[/x/".to_string(), "#side".to_string()];
        rule.frosted_level = 25;

        let diagnostics = validate_rules(&[rule]);
        assert_eq!(diagnostics.len(), 4);
        assert!(matches!(diagnostics[0].kind, DiagnosticKind::UrlPattern(_)));
        assert_eq!(
            diagnostics[1].kind,
            DiagnosticKind::TitleExpression("malformed expression".to_string())
        );
        assert!(matches!(
            &diagnostics[2].kind,
            DiagnosticKind::ContentExpression { selector, .. } if selector == "#main"
        ));
        assert_eq!(
            diagnostics[3].kind,
            DiagnosticKind::LevelOutOfRange { field: "frostedLevel", value: 25 }
        );
        assert_eq!(diagnostics[3].to_string(), "[bad] frostedLevel 25 clamped to [0, 20]");
    }
}
