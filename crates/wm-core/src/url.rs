//! URL pattern decomposition
//!
//! These functions work directly on string slices of the *pattern* (not the
//! page URL) and feed the specificity part of the match score.

// =============================================================================
// Scheme / Host / Path
// =============================================================================

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(pattern: &str) -> Option<usize> {
    pattern.find("://").map(|pos| pos + 3)
}

/// Host portion of a pattern: text after "://" up to the next '/'.
/// Returns `None` when the pattern has no scheme separator.
#[inline]
pub fn extract_host(pattern: &str) -> Option<&str> {
    let scheme_end = get_scheme_end(pattern)?;
    let rest = &pattern[scheme_end..];
    let host_end = rest.find('/').unwrap_or(rest.len());
    Some(&rest[..host_end])
}

/// Path portion of a pattern: from the first '/' after the host to the end.
///
/// Patterns without a scheme separator have no host, so the path starts at
/// their first '/'.
#[inline]
pub fn extract_path(pattern: &str) -> Option<&str> {
    let search_start = get_scheme_end(pattern).unwrap_or(0);
    let path_start = pattern[search_start..].find('/')? + search_start;
    Some(&pattern[path_start..])
}

// =============================================================================
// Specificity Metrics
// =============================================================================

/// Number of non-empty host labels that contain no wildcard.
pub fn domain_specificity(pattern: &str) -> usize {
    match extract_host(pattern) {
        Some(host) => host
            .split('.')
            .filter(|label| !label.is_empty() && !label.contains('*'))
            .count(),
        None => 0,
    }
}

/// Length of the path portion with every `*` stripped.
pub fn path_length(pattern: &str) -> usize {
    match extract_path(pattern) {
        Some(path) => path.chars().filter(|&c| c != '*').count(),
        None => 0,
    }
}

/// Number of `*` in the whole pattern.
#[inline]
pub fn wildcard_count(pattern: &str) -> usize {
    pattern.bytes().filter(|&b| b == b'*').count()
}

// =============================================================================
// Origin Normalization
// =============================================================================

/// True for a bare `scheme://host` pattern (lowercase scheme, no path).
pub fn is_bare_origin(pattern: &str) -> bool {
    let Some(colon) = pattern.find("://") else {
        return false;
    };
    let scheme = &pattern[..colon];
    let host = &pattern[colon + 3..];
    !scheme.is_empty()
        && scheme.bytes().all(|b| b.is_ascii_lowercase())
        && !host.is_empty()
        && !host.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        assert_eq!(extract_host("https://example.com/path"), Some("example.com"));
        assert_eq!(extract_host("https://*.example.com/*"), Some("*.example.com"));
        assert_eq!(extract_host("https://example.com"), Some("example.com"));
        assert_eq!(extract_host("example.com/path"), None);
    }

    #[test]
    fn test_extract_path() {
        assert_eq!(extract_path("https://example.com/docs/*"), Some("/docs/*"));
        assert_eq!(extract_path("https://example.com"), None);
        assert_eq!(extract_path("*example.com/a"), Some("/a"));
    }

    #[test]
    fn test_specificity_metrics() {
        assert_eq!(domain_specificity("https://www.example.com/"), 3);
        assert_eq!(domain_specificity("https://*.example.com/"), 2);
        assert_eq!(domain_specificity("*/docs"), 0);

        assert_eq!(path_length("https://example.com/docs/*"), 6);
        assert_eq!(path_length("https://example.com/*"), 1);
        assert_eq!(path_length("https://example.com"), 0);

        assert_eq!(wildcard_count("https://*.example.com/*/x*"), 3);
    }

    #[test]
    fn test_is_bare_origin() {
        assert!(is_bare_origin("https://example.com"));
        assert!(is_bare_origin("http://localhost:8080"));
        assert!(!is_bare_origin("https://example.com/"));
        assert!(!is_bare_origin("HTTPS://example.com"));
        assert!(!is_bare_origin("example.com"));
    }
}
