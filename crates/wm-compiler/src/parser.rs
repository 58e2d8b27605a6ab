use serde_json::{Map, Value};

use wm_core::types::{DEFAULT_DESATURATE_LEVEL, DEFAULT_FROSTED_LEVEL};
use wm_core::url::is_bare_origin;
use wm_core::Rule;

use crate::id::generate_id;
use crate::optimizer::dedupe_rules;

/// Key the rule list is stored under.
pub const STORAGE_KEY: &str = "sites";

/// Error type for reading a rule file.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of compiling a stored rule list.
#[derive(Debug, Clone, Default)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
    /// Records found in the store
    pub records: usize,
    /// Records that were not objects
    pub skipped: usize,
    /// Records that relied on legacy fields
    pub upgraded: usize,
    /// Records that needed a generated id
    pub generated_ids: usize,
    /// Records dropped for reusing an earlier id
    pub duplicate_ids: usize,
}

/// Compile whatever is stored under [`STORAGE_KEY`].
///
/// An array is a rule list; a single object is a legacy one-rule store;
/// anything else is an empty list.
pub fn parse_stored_rules(raw: &Value, now_ms: u64) -> ParsedRules {
    let records: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![raw],
        Value::Null => Vec::new(),
        other => {
            log::warn!("ignoring stored rules of unexpected type: {}", type_name(other));
            Vec::new()
        }
    };

    let mut parsed = ParsedRules {
        records: records.len(),
        ..ParsedRules::default()
    };

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(fields) = record else {
            parsed.skipped += 1;
            continue;
        };
        let normalized = normalize_rule(fields, index, now_ms);
        if normalized.upgraded {
            parsed.upgraded += 1;
        }
        if normalized.generated_id {
            parsed.generated_ids += 1;
        }
        parsed.rules.push(normalized.rule);
    }

    parsed.duplicate_ids = dedupe_rules(&mut parsed.rules).deduped;
    parsed
}

/// Parse a JSON document holding either the rule list itself or a storage
/// snapshot object `{ "sites": [...] }`.
pub fn parse_rules_json(text: &str, now_ms: u64) -> Result<ParsedRules, CompileError> {
    let value: Value = serde_json::from_str(text)?;
    let raw = match &value {
        Value::Object(fields) if fields.contains_key(STORAGE_KEY) => &fields[STORAGE_KEY],
        _ => &value,
    };
    Ok(parse_stored_rules(raw, now_ms))
}

/// One normalized record.
#[derive(Debug, Clone)]
pub struct NormalizedRule {
    pub rule: Rule,
    pub upgraded: bool,
    pub generated_id: bool,
}

/// Normalize a stored record, upgrading legacy fields.
pub fn normalize_rule(fields: &Map<String, Value>, index: usize, now_ms: u64) -> NormalizedRule {
    let mut upgraded = false;

    let url_pattern = normalize_url_pattern(str_field(fields, "urlPattern").unwrap_or(""));

    let (id, generated_id) = match str_field(fields, "id").filter(|id| !id.is_empty()) {
        Some(id) => (id.to_string(), false),
        None => (generate_id(now_ms, index, &url_pattern), true),
    };

    let title_mask_expression = match str_field(fields, "titleMaskExpression").filter(|e| !e.is_empty()) {
        Some(expression) => Some(expression.to_string()),
        None => {
            let legacy = legacy_title_expression(fields);
            upgraded |= legacy.is_some();
            legacy
        }
    };

    let content_selectors = match fields.get("contentSelectors") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => match str_field(fields, "contentSelector").filter(|s| !s.is_empty()) {
            Some(selector) => {
                upgraded = true;
                vec![selector.to_string()]
            }
            None => Vec::new(),
        },
    };

    let rule = Rule {
        id,
        name: str_field(fields, "name").unwrap_or("").to_string(),
        url_pattern,
        enabled: fields.get("enabled") != Some(&Value::Bool(false)),
        content_selectors,
        title_mask_expression,
        icon_url: str_field(fields, "iconUrl")
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        frosted_level: level_field(fields, "frostedLevel").unwrap_or(DEFAULT_FROSTED_LEVEL),
        desaturate_level: level_field(fields, "desaturateLevel").unwrap_or(DEFAULT_DESATURATE_LEVEL),
    };

    NormalizedRule {
        rule,
        upgraded,
        generated_id,
    }
}

/// Append `/` to a bare `scheme://host` pattern.
pub fn normalize_url_pattern(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_bare_origin(trimmed) {
        format!("{}/", trimmed)
    } else {
        raw.to_string()
    }
}

/// `titleMaskSource`/`titleMaskRegex` + `titleMaskReplacement`/`titleMaskText`.
fn legacy_title_expression(fields: &Map<String, Value>) -> Option<String> {
    let source = first_non_empty(fields, &["titleMaskSource", "titleMaskRegex"]);
    let replacement = first_non_empty(fields, &["titleMaskReplacement", "titleMaskText"])?;
    Some(match source {
        Some(source) => format!("/{}/{}/g", source, replacement),
        None => format!("/.*/{}/", replacement),
    })
}

fn first_non_empty<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| str_field(fields, key))
        .find(|value| !value.is_empty())
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// Finite numbers only, rounded to the nearest whole level.
fn level_field(fields: &Map<String, Value>, key: &str) -> Option<i32> {
    let value = fields.get(key)?.as_f64()?;
    value.is_finite().then(|| value.round() as i32)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn parses_modern_records() {
        let raw = json!([{
            "id": "rule-1",
            "name": "Mail",
            "urlPattern": "https://mail.example.com/*",
            "titleMaskExpression": "/.*/Notes/",
            "iconUrl": " https://cdn.test/icon.png ",
            "contentSelectors": ["#main", "  ", ".subject#/secret/***/g", 42],
            "frostedLevel": 14,
            "desaturateLevel": 3,
            "enabled": true
        }]);
        let parsed = parse_stored_rules(&raw, NOW);
        assert_eq!(parsed.records, 1);
        assert_eq!(parsed.upgraded, 0);

        let rule = &parsed.rules[0];
        assert_eq!(rule.id, "rule-1");
        assert_eq!(rule.name, "Mail");
        assert_eq!(rule.content_selectors, vec!["#main", ".subject#/secret/***/g"]);
        assert_eq!(rule.title_mask_expression.as_deref(), Some("/.*/Notes/"));
        assert_eq!(rule.icon_url.as_deref(), Some("https://cdn.test/icon.png"));
        assert_eq!(rule.frosted_level, 14);
        assert_eq!(rule.desaturate_level, 3);
        assert!(rule.enabled);
    }

    #[test]
    fn applies_defaults() {
        let parsed = parse_stored_rules(&json!([{ "urlPattern": "https://x.test/a" }]), NOW);
        let rule = &parsed.rules[0];
        assert!(rule.id.starts_with("rule-1700000000000-"));
        assert_eq!(parsed.generated_ids, 1);
        assert!(rule.enabled);
        assert_eq!(rule.frosted_level, 10);
        assert_eq!(rule.desaturate_level, 0);
        assert!(rule.title_mask_expression.is_none());
        assert!(rule.icon_url.is_none());
    }

    #[test]
    fn only_explicit_false_disables() {
        let parsed = parse_stored_rules(
            &json!([
                { "id": "a", "urlPattern": "x", "enabled": false },
                { "id": "b", "urlPattern": "x", "enabled": 0 },
                { "id": "c", "urlPattern": "x", "enabled": null }
            ]),
            NOW,
        );
        let enabled: Vec<bool> = parsed.rules.iter().map(|r| r.enabled).collect();
        assert_eq!(enabled, vec![false, true, true]);
    }

    #[test]
    fn non_numeric_levels_fall_back() {
        let parsed = parse_stored_rules(
            &json!([{ "id": "a", "urlPattern": "x", "frostedLevel": "12", "desaturateLevel": 25.7 }]),
            NOW,
        );
        assert_eq!(parsed.rules[0].frosted_level, 10);
        // Range is enforced at render time, not here
        assert_eq!(parsed.rules[0].desaturate_level, 26);
    }

    #[test]
    fn fractional_levels_round() {
        let parsed = parse_stored_rules(
            &json!([{ "id": "a", "urlPattern": "x", "frostedLevel": 12.7, "desaturateLevel": 3.2 }]),
            NOW,
        );
        assert_eq!(parsed.rules[0].frosted_level, 13);
        assert_eq!(parsed.rules[0].desaturate_level, 3);
    }

    #[test]
    fn upgrades_legacy_title_fields() {
        let parsed = parse_stored_rules(
            &json!([
                { "id": "a", "urlPattern": "x", "titleMaskSource": "Inbox", "titleMaskReplacement": "Notes" },
                { "id": "b", "urlPattern": "x", "titleMaskRegex": "Mail", "titleMaskText": "Docs" },
                { "id": "c", "urlPattern": "x", "titleMaskText": "Plain" },
                { "id": "d", "urlPattern": "x", "titleMaskSource": "orphan" },
                { "id": "e", "urlPattern": "x", "titleMaskExpression": "/a/b/", "titleMaskText": "ignored" }
            ]),
            NOW,
        );
        let titles: Vec<Option<&str>> = parsed
            .rules
            .iter()
            .map(|r| r.title_mask_expression.as_deref())
            .collect();
        assert_eq!(
            titles,
            vec![
                Some("/Inbox/Notes/g"),
                Some("/Mail/Docs/g"),
                Some("/.*/Plain/"),
                None,
                Some("/a/b/"),
            ]
        );
        assert_eq!(parsed.upgraded, 3);
    }

    #[test]
    fn source_precedence_prefers_modern_legacy_names() {
        let fields = json!({
            "id": "a",
            "urlPattern": "x",
            "titleMaskSource": "S",
            "titleMaskRegex": "R",
            "titleMaskReplacement": "P",
            "titleMaskText": "T"
        });
        let normalized = normalize_rule(fields.as_object().unwrap(), 0, NOW);
        assert_eq!(normalized.rule.title_mask_expression.as_deref(), Some("/S/P/g"));
    }

    #[test]
    fn upgrades_single_content_selector() {
        let parsed = parse_stored_rules(
            &json!({ "id": "a", "urlPattern": "https://x.test/", "contentSelector": "#app" }),
            NOW,
        );
        assert_eq!(parsed.records, 1);
        assert_eq!(parsed.rules[0].content_selectors, vec!["#app"]);
        assert_eq!(parsed.upgraded, 1);
    }

    #[test]
    fn normalizes_bare_origins() {
        assert_eq!(normalize_url_pattern("https://example.com"), "https://example.com/");
        assert_eq!(normalize_url_pattern(" https://example.com "), "https://example.com/");
        assert_eq!(normalize_url_pattern("https://example.com/*"), "https://example.com/*");
        assert_eq!(normalize_url_pattern("/example/i"), "/example/i");
    }

    #[test]
    fn malformed_stores_are_empty() {
        assert!(parse_stored_rules(&Value::Null, NOW).rules.is_empty());
        assert!(parse_stored_rules(&json!("sites"), NOW).rules.is_empty());
        assert!(parse_stored_rules(&json!(7), NOW).rules.is_empty());

        let parsed = parse_stored_rules(&json!([1, "x", null, { "id": "ok", "urlPattern": "x" }]), NOW);
        assert_eq!(parsed.records, 4);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.rules.len(), 1);
    }

    #[test]
    fn drops_duplicate_ids() {
        let parsed = parse_stored_rules(
            &json!([
                { "id": "a", "urlPattern": "https://one.test/" },
                { "id": "a", "urlPattern": "https://two.test/" }
            ]),
            NOW,
        );
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].url_pattern, "https://one.test/");
        assert_eq!(parsed.duplicate_ids, 1);
    }

    #[test]
    fn reads_storage_snapshots_and_bare_lists() {
        let snapshot = r#"{ "sites": [{ "id": "a", "urlPattern": "https://x.test/*" }] }"#;
        assert_eq!(parse_rules_json(snapshot, NOW).unwrap().rules.len(), 1);

        let list = r#"[{ "id": "a", "urlPattern": "https://x.test/*" }]"#;
        assert_eq!(parse_rules_json(list, NOW).unwrap().rules.len(), 1);

        assert!(matches!(parse_rules_json("[", NOW), Err(CompileError::Json(_))));
    }
}
