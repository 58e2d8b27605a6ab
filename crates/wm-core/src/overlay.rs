//! Overlay rendering
//!
//! The overlay is a singleton root element covering the whole document. Each
//! render replaces its single "blocker" layer: a transparent layer whose
//! backdrop filter blurs and desaturates what lies behind it, clipped by the
//! mask so the revealed elements stay untouched.
//!
//! Before the first successful render the whole page is hidden by a style
//! rule. The renderer lifts it exactly once.

use std::fmt;

use crate::host::PageHost;
use crate::mask::{build_mask, MaskGeometry};
use crate::types::{DocumentSize, Rect, Rule};

/// Background of the blocker when no element could be revealed.
pub const OPAQUE_FILL: &str = "#202124";

/// Backdrop filter applied by the blocker layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackdropFilter {
    /// Blur radius in pixels, within `[0, 20]`
    pub blur_px: u8,
    /// Saturation multiplier, within `[0, 1]`
    pub saturation: f64,
}

impl BackdropFilter {
    pub fn for_rule(rule: &Rule) -> Self {
        let desaturate = rule.clamped_desaturate_level() as f64;
        Self {
            blur_px: rule.clamped_frosted_level(),
            saturation: (1.0 - desaturate / 10.0).max(0.0),
        }
    }
}

impl fmt::Display for BackdropFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blur({}px) saturate({:.2})", self.blur_px, self.saturation)
    }
}

/// What the host should paint into the overlay root.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// Filtered blocker clipped by a mask with holes
    Masked {
        mask: MaskGeometry,
        filter: BackdropFilter,
    },
    /// Nothing resolved: block everything with an opaque fill
    Opaque {
        size: DocumentSize,
        filter: BackdropFilter,
        fill: &'static str,
    },
}

impl Paint {
    pub fn filter(&self) -> BackdropFilter {
        match self {
            Self::Masked { filter, .. } | Self::Opaque { filter, .. } => *filter,
        }
    }
}

/// Owns overlay state across renders: whether the hide style is in place and
/// whether it has been lifted.
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    hide_installed: bool,
    hide_lifted: bool,
    renders: usize,
    last_paint: Option<Paint>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide the page until the first render. No-op once lifted.
    pub fn install_hide<H: PageHost>(&mut self, host: &mut H) {
        if self.hide_installed || self.hide_lifted {
            return;
        }
        host.install_hide_style();
        self.hide_installed = true;
    }

    /// Make the page visible again. Only the first call does anything.
    pub fn lift_hide<H: PageHost>(&mut self, host: &mut H) -> bool {
        if self.hide_lifted {
            return false;
        }
        host.remove_hide_style();
        self.hide_lifted = true;
        true
    }

    /// Paint the overlay for `rule` revealing `rects`, then lift the hide.
    pub fn render<H: PageHost>(
        &mut self,
        host: &mut H,
        rule: &Rule,
        rects: &[Rect],
        size: DocumentSize,
    ) -> &Paint {
        host.ensure_overlay_root(size);
        host.clear_overlay();

        let filter = BackdropFilter::for_rule(rule);
        let mask = build_mask(rects, size);
        let paint = if mask.is_opaque() {
            Paint::Opaque {
                size,
                filter,
                fill: OPAQUE_FILL,
            }
        } else {
            Paint::Masked { mask, filter }
        };

        host.paint_overlay(&paint);
        self.renders += 1;
        if self.lift_hide(host) {
            log::debug!("page revealed after first render of rule {}", rule.id);
        }

        self.last_paint.insert(paint)
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn is_hide_lifted(&self) -> bool {
        self.hide_lifted
    }

    pub fn last_paint(&self) -> Option<&Paint> {
        self.last_paint.as_ref()
    }
}
