//! The page abstraction
//!
//! [`PageHost`] is everything the engine needs from a live document. The wasm
//! crate implements it on top of `web-sys`; tests implement it in memory.

use crate::overlay::Paint;
use crate::types::{DocumentSize, ScrollOffset, ViewportRect};

/// Element id of the overlay root.
pub const OVERLAY_ROOT_ID: &str = "wm-overlay-root";

/// Element id of the pre-ready hide style.
pub const HIDE_STYLE_ID: &str = "wm-hide-style";

/// CSS installed while the page must stay invisible.
pub const HIDE_STYLE_CSS: &str = "html{visibility:hidden !important;}";

/// Attribute stamped on elements whose text was already rewritten.
pub const MARKER_ATTRIBUTE: &str = "data-wm-masked";

/// Selector for favicon link elements.
pub const ICON_LINK_SELECTOR: &str =
    "link[rel~=\"icon\"], link[rel~=\"shortcut\"], link[rel=\"shortcut icon\"]";

/// Document readiness, as reported by `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Parse a `readyState` string. Unknown values count as complete.
    pub fn from_str(s: &str) -> Self {
        match s {
            "loading" => Self::Loading,
            "interactive" => Self::Interactive,
            _ => Self::Complete,
        }
    }

    /// True once the DOM can be queried.
    pub fn is_ready(self) -> bool {
        self != Self::Loading
    }
}

pub trait PageHost {
    /// Handle to a DOM element.
    type Element;

    fn ready_state(&self) -> ReadyState;

    // --- geometry ---

    /// First element matching `selector`. Invalid selectors resolve to nothing.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;
    fn bounding_rect(&self, element: &Self::Element) -> ViewportRect;
    fn scroll_offset(&self) -> ScrollOffset;
    fn viewport_size(&self) -> DocumentSize;
    fn scroll_size(&self) -> DocumentSize;

    /// Full document extent: the larger of scroll size and viewport per axis.
    fn document_size(&self) -> DocumentSize {
        self.scroll_size().max(self.viewport_size())
    }

    // --- text ---

    fn title(&self) -> String;
    fn set_title(&mut self, title: &str);
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_attribute(&mut self, element: &Self::Element, name: &str, value: &str);

    /// Visit every text node under `element`; `rewrite` returns the new text
    /// for nodes that change. Returns the number of nodes rewritten.
    fn rewrite_text_nodes(
        &mut self,
        element: &Self::Element,
        rewrite: &mut dyn FnMut(&str) -> Option<String>,
    ) -> usize;

    // --- favicon ---

    fn icon_links(&self) -> Vec<Self::Element>;
    /// Append a new `<link rel="icon">`. Returns false without a `<head>`.
    fn append_icon_link(&mut self, href: &str) -> bool;

    // --- overlay ---

    /// Create the overlay root if missing and size it to `size`.
    fn ensure_overlay_root(&mut self, size: DocumentSize);
    /// Remove whatever the overlay root currently holds.
    fn clear_overlay(&mut self);
    fn paint_overlay(&mut self, paint: &Paint);
    fn install_hide_style(&mut self);
    fn remove_hide_style(&mut self);

    // --- observation ---

    /// Start observing title mutations. Dropping the subscription stops it.
    fn observe_title(&mut self) -> Subscription;
}

/// Unsubscribe handle for a host event subscription.
///
/// The cancel callback runs exactly once: on [`Subscription::unsubscribe`] or
/// on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
