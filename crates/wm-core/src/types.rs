//! Core type definitions for WebMask
//!
//! Rule records as they come out of the rule store, plus the geometry
//! primitives shared by the collector, the mask builder and the renderer.

use serde::{Deserialize, Serialize};

use crate::pattern::PatternError;
use crate::substitution::Substitution;

/// Upper bound for both `frostedLevel` and `desaturateLevel`.
pub const MAX_EFFECT_LEVEL: i32 = 20;

/// Blur applied when a record carries no usable `frostedLevel`.
pub const DEFAULT_FROSTED_LEVEL: i32 = 10;

/// Desaturation applied when a record carries no usable `desaturateLevel`.
pub const DEFAULT_DESATURATE_LEVEL: i32 = 0;

// =============================================================================
// Rule
// =============================================================================

/// A persisted masking rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique rule identity
    pub id: String,
    /// Display name (informational only)
    #[serde(default)]
    pub name: String,
    /// Literal URL, wildcard pattern or `/source/flags` regex literal
    pub url_pattern: String,
    /// Disabled rules never match
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `selector` or `selector#/pattern/replacement/flags` entries
    #[serde(default)]
    pub content_selectors: Vec<String>,
    /// Optional `/pattern/replacement/flags` applied to the document title
    #[serde(default)]
    pub title_mask_expression: Option<String>,
    /// Optional favicon replacement
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Blur radius in pixels for the obscured region
    #[serde(default = "default_frosted_level")]
    pub frosted_level: i32,
    /// Saturation reduction for the obscured region
    #[serde(default)]
    pub desaturate_level: i32,
}

fn default_enabled() -> bool {
    true
}

fn default_frosted_level() -> i32 {
    DEFAULT_FROSTED_LEVEL
}

impl Rule {
    /// Create an enabled rule with default effect levels.
    pub fn new(id: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            url_pattern: url_pattern.into(),
            enabled: true,
            content_selectors: Vec::new(),
            title_mask_expression: None,
            icon_url: None,
            frosted_level: DEFAULT_FROSTED_LEVEL,
            desaturate_level: DEFAULT_DESATURATE_LEVEL,
        }
    }

    /// Parsed content selector entries, in stored order.
    pub fn selector_entries(&self) -> impl Iterator<Item = SelectorEntry<'_>> {
        self.content_selectors
            .iter()
            .filter_map(|raw| SelectorEntry::parse(raw))
    }

    /// Title expression, if present and not blank.
    pub fn title_expression(&self) -> Option<&str> {
        self.title_mask_expression
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
    }

    /// Favicon URL, if present and not blank.
    pub fn icon(&self) -> Option<&str> {
        self.icon_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Blur radius clamped to `[0, MAX_EFFECT_LEVEL]`.
    #[inline]
    pub fn clamped_frosted_level(&self) -> u8 {
        self.frosted_level.clamp(0, MAX_EFFECT_LEVEL) as u8
    }

    /// Desaturation level clamped to `[0, MAX_EFFECT_LEVEL]`.
    #[inline]
    pub fn clamped_desaturate_level(&self) -> u8 {
        self.desaturate_level.clamp(0, MAX_EFFECT_LEVEL) as u8
    }
}

// =============================================================================
// Selector Entries
// =============================================================================

/// One `contentSelectors` entry split into its CSS part and optional
/// substitution expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorEntry<'a> {
    pub selector: &'a str,
    pub expression: Option<&'a str>,
}

impl<'a> SelectorEntry<'a> {
    /// Split `selector#/pattern/replacement/flags`. Blank selectors yield `None`.
    ///
    /// The split happens at the last `#/` followed by a well-formed
    /// expression, so selectors such as `a[href="#/inbox"]` stay whole.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let raw = raw.trim();
        let split = raw
            .rmatch_indices("#/")
            .map(|(pos, _)| pos)
            // Keep the leading `/` of the expression
            .find(|&pos| Substitution::parse(&raw[pos + 1..]).is_some());
        let (selector, expression) = match split {
            Some(pos) => (raw[..pos].trim(), Some(&raw[pos + 1..])),
            None => (raw, None),
        };
        if selector.is_empty() {
            return None;
        }
        Some(Self { selector, expression })
    }
}

// =============================================================================
// Regex Flags
// =============================================================================

bitflags::bitflags! {
    /// Flags accepted in `/source/flags` literals.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegexFlags: u8 {
        /// g - replace every occurrence
        const GLOBAL = 1 << 0;
        /// i - case-insensitive
        const IGNORE_CASE = 1 << 1;
        /// m - `^`/`$` match at line boundaries
        const MULTI_LINE = 1 << 2;
        /// s - `.` matches newlines
        const DOT_ALL = 1 << 3;
        /// u - unicode (always on for our engine)
        const UNICODE = 1 << 4;
        /// y - sticky (accepted, ignored)
        const STICKY = 1 << 5;
        /// d - match indices (accepted, ignored)
        const HAS_INDICES = 1 << 6;
    }
}

impl RegexFlags {
    /// Parse a flag string. Unknown or repeated flags are rejected.
    pub fn parse(flags: &str) -> Result<Self, PatternError> {
        let mut parsed = Self::empty();
        for c in flags.chars() {
            let flag = match c {
                'g' => Self::GLOBAL,
                'i' => Self::IGNORE_CASE,
                'm' => Self::MULTI_LINE,
                's' => Self::DOT_ALL,
                'u' => Self::UNICODE,
                'y' => Self::STICKY,
                'd' => Self::HAS_INDICES,
                _ => return Err(PatternError::InvalidFlags(flags.to_string())),
            };
            if parsed.contains(flag) {
                return Err(PatternError::InvalidFlags(flags.to_string()));
            }
            parsed |= flag;
        }
        Ok(parsed)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Element bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Current scroll position of the document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Width/height pair for viewports and documents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentSize {
    pub width: f64,
    pub height: f64,
}

impl DocumentSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Per-axis maximum of two sizes.
    pub fn max(self, other: Self) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// Rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Translate a viewport box into document coordinates.
    pub fn from_viewport(rect: ViewportRect, scroll: ScrollOffset) -> Self {
        let left = rect.left + scroll.x;
        let top = rect.top + scroll.y;
        Self {
            left,
            top,
            right: left + rect.width,
            bottom: top + rect.height,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// True when the rect has no positive area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Clamp to `[0, size]` on both axes.
    pub fn clamp_to(&self, size: DocumentSize) -> Self {
        Self {
            left: self.left.clamp(0.0, size.width),
            top: self.top.clamp(0.0, size.height),
            right: self.right.clamp(0.0, size.width),
            bottom: self.bottom.clamp(0.0, size.height),
        }
    }
}
