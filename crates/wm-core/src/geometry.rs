//! Selector to document-rect resolution

use crate::host::PageHost;
use crate::types::{Rect, Rule};

/// Resolve each selector to the document rect of its first matching element.
///
/// Selectors with no element, and elements with no positive area, are
/// skipped. Output follows selector order; overlapping rects are kept.
pub fn collect_rects<H, S>(host: &H, selectors: &[S]) -> Vec<Rect>
where
    H: PageHost,
    S: AsRef<str>,
{
    let scroll = host.scroll_offset();
    let mut rects = Vec::with_capacity(selectors.len());

    for selector in selectors {
        let selector = selector.as_ref();
        let Some(element) = host.query_selector(selector) else {
            log::debug!("selector {:?} matched nothing", selector);
            continue;
        };
        let bounds = host.bounding_rect(&element);
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            continue;
        }
        rects.push(Rect::from_viewport(bounds, scroll));
    }

    rects
}

/// Rects for every content selector of `rule`.
pub fn collect_rule_rects<H: PageHost>(host: &H, rule: &Rule) -> Vec<Rect> {
    let selectors: Vec<&str> = rule.selector_entries().map(|entry| entry.selector).collect();
    collect_rects(host, &selectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use crate::types::ScrollOffset;

    #[test]
    fn collects_in_selector_order_with_scroll() {
        let mut host = FakeHost::new()
            .with_element("#main", 10.0, 20.0, 100.0, 50.0)
            .with_element(".side", 500.0, -40.0, 200.0, 80.0);
        host.scroll = ScrollOffset { x: 0.0, y: 100.0 };

        let rects = collect_rects(&host, &[".side", "#missing", "#main"]);
        assert_eq!(
            rects,
            vec![
                Rect::new(500.0, 60.0, 700.0, 140.0),
                Rect::new(10.0, 120.0, 110.0, 170.0),
            ]
        );
    }

    #[test]
    fn skips_elements_without_area() {
        let host = FakeHost::new()
            .with_element("#hidden", 10.0, 10.0, 0.0, 40.0)
            .with_element("#flat", 10.0, 10.0, 40.0, -1.0);
        assert!(collect_rects(&host, &["#hidden", "#flat"]).is_empty());
    }

    #[test]
    fn rule_rects_ignore_substitution_suffix() {
        let host = FakeHost::new().with_element("#main", 0.0, 0.0, 10.0, 10.0);
        let mut rule = Rule::new("r", "https://example.com/*");
        rule.content_selectors = vec!["#main#/a/b/g".to_string(), "  ".to_string()];
        assert_eq!(collect_rule_rects(&host, &rule), vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
    }
}
