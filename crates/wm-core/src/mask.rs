//! Clip mask construction
//!
//! The mask is one SVG path: the full-document rectangle followed by a
//! rounded-rectangle subpath per revealed element, filled with the even-odd
//! rule so each hole subtracts from the outer fill.

use std::fmt::Write;

use crate::types::{DocumentSize, Rect};

/// Largest corner radius of a hole, in pixels.
pub const MAX_CORNER_RADIUS: f64 = 8.0;

/// Fill rule the path is meant to be used with.
pub const FILL_RULE: &str = "evenodd";

/// One rounded cut-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hole {
    pub rect: Rect,
    pub radius: f64,
}

/// Outer rectangle minus rounded holes.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskGeometry {
    pub size: DocumentSize,
    pub holes: Vec<Hole>,
    pub path: String,
}

impl MaskGeometry {
    /// True when nothing is revealed.
    pub fn is_opaque(&self) -> bool {
        self.holes.is_empty()
    }

    /// CSS `clip-path` value for this mask.
    pub fn css_clip_path(&self) -> String {
        format!("path({}, \"{}\")", FILL_RULE, self.path)
    }
}

/// Build the clip mask for `rects` over a document of `size`.
///
/// Rects are clamped to the document; those left without area produce no
/// hole. The result depends only on its inputs.
pub fn build_mask(rects: &[Rect], size: DocumentSize) -> MaskGeometry {
    let mut path = String::new();
    let _ = write!(
        path,
        "M0 0H{}V{}H0Z",
        fmt_num(size.width),
        fmt_num(size.height)
    );

    let mut holes = Vec::with_capacity(rects.len());
    for rect in rects {
        let clamped = rect.clamp_to(size);
        if clamped.is_degenerate() {
            continue;
        }
        let radius = corner_radius(&clamped);
        push_rounded_rect(&mut path, &clamped, radius);
        holes.push(Hole {
            rect: clamped,
            radius,
        });
    }

    MaskGeometry { size, holes, path }
}

/// `min(8, floor(width / 2), floor(height / 2))`
#[inline]
pub fn corner_radius(rect: &Rect) -> f64 {
    MAX_CORNER_RADIUS
        .min((rect.width() / 2.0).floor())
        .min((rect.height() / 2.0).floor())
}

/// Clockwise rounded rectangle starting at the end of the top-left arc.
fn push_rounded_rect(path: &mut String, rect: &Rect, r: f64) {
    let (l, t, rt, b) = (rect.left, rect.top, rect.right, rect.bottom);

    if r <= 0.0 {
        let _ = write!(
            path,
            "M{} {}H{}V{}H{}Z",
            fmt_num(l),
            fmt_num(t),
            fmt_num(rt),
            fmt_num(b),
            fmt_num(l)
        );
        return;
    }

    let rs = fmt_num(r);
    let _ = write!(path, "M{} {}", fmt_num(l + r), fmt_num(t));
    let _ = write!(path, "H{}", fmt_num(rt - r));
    let _ = write!(path, "A{rs} {rs} 0 0 1 {} {}", fmt_num(rt), fmt_num(t + r));
    let _ = write!(path, "V{}", fmt_num(b - r));
    let _ = write!(path, "A{rs} {rs} 0 0 1 {} {}", fmt_num(rt - r), fmt_num(b));
    let _ = write!(path, "H{}", fmt_num(l + r));
    let _ = write!(path, "A{rs} {rs} 0 0 1 {} {}", fmt_num(l), fmt_num(b - r));
    let _ = write!(path, "V{}", fmt_num(t + r));
    let _ = write!(path, "A{rs} {rs} 0 0 1 {} {}Z", fmt_num(l + r), fmt_num(t));
}

/// Format a coordinate with at most two decimals and no trailing zeros.
pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        return format!("{}", rounded as i64);
    }
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').to_string()
}
