//! Title, content text and favicon rewriting

use crate::host::{PageHost, MARKER_ATTRIBUTE};
use crate::substitution::{compile_expression, CompiledSubstitution};
use crate::types::Rule;

/// Flags used by content substitutions that carry none.
pub const CONTENT_DEFAULT_FLAGS: &str = "g";

// =============================================================================
// Title
// =============================================================================

/// Applies a rule's title expression, remembering what it wrote so that the
/// title observer does not react to its own writes.
#[derive(Debug)]
pub struct TitleRewriter {
    substitution: CompiledSubstitution,
    last_written: Option<String>,
}

impl TitleRewriter {
    /// `None` when the rule has no usable title expression.
    pub fn for_rule(rule: &Rule) -> Option<Self> {
        let substitution = compile_expression(rule.title_expression()?, "")?;
        Some(Self {
            substitution,
            last_written: None,
        })
    }

    /// Rewrite the current title. Returns true when the title was changed.
    pub fn apply<H: PageHost>(&mut self, host: &mut H) -> bool {
        let current = host.title();
        if self.last_written.as_deref() == Some(current.as_str()) {
            return false;
        }

        let next = self.substitution.apply(&current);
        if next == current {
            return false;
        }

        let next = next.into_owned();
        host.set_title(&next);
        self.last_written = Some(next);
        true
    }
}

/// One-shot title rewrite for `rule`.
pub fn rewrite_title<H: PageHost>(host: &mut H, rule: &Rule) -> bool {
    TitleRewriter::for_rule(rule).map_or(false, |mut rewriter| rewriter.apply(host))
}

// =============================================================================
// Content
// =============================================================================

/// Rewrite text under every content selector that carries an expression.
///
/// Elements already stamped with this rule's id are left alone. Returns the
/// number of elements processed.
pub fn rewrite_content<H: PageHost>(host: &mut H, rule: &Rule) -> usize {
    let mut processed = 0;

    for entry in rule.selector_entries() {
        let Some(expression) = entry.expression else {
            continue;
        };
        let Some(element) = host.query_selector(entry.selector) else {
            continue;
        };
        if host.attribute(&element, MARKER_ATTRIBUTE).as_deref() == Some(rule.id.as_str()) {
            continue;
        }
        let Some(substitution) = compile_expression(expression, CONTENT_DEFAULT_FLAGS) else {
            continue;
        };

        let nodes = host.rewrite_text_nodes(&element, &mut |text: &str| {
            let next = substitution.apply(text);
            (next != text).then(|| next.into_owned())
        });
        host.set_attribute(&element, MARKER_ATTRIBUTE, &rule.id);
        log::debug!("rewrote {} text nodes under {:?}", nodes, entry.selector);
        processed += 1;
    }

    processed
}

// =============================================================================
// Favicon
// =============================================================================

/// Point every icon link at the rule's icon, creating one if none exist.
pub fn rewrite_icon<H: PageHost>(host: &mut H, rule: &Rule) -> bool {
    let Some(href) = rule.icon() else {
        return false;
    };

    let links = host.icon_links();
    if links.is_empty() {
        return host.append_icon_link(href);
    }
    for link in &links {
        host.set_attribute(link, "href", href);
    }
    true
}
