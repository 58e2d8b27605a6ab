//! `web-sys` implementation of the page host.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MutationObserver, MutationObserverInit, Window};

use wm_core::host::{
    ReadyState, HIDE_STYLE_CSS, HIDE_STYLE_ID, ICON_LINK_SELECTOR, OVERLAY_ROOT_ID,
};
use wm_core::mask::fmt_num;
use wm_core::types::{DocumentSize, ScrollOffset, ViewportRect};
use wm_core::{PageHost, Paint, Subscription};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

const BLOCKER_CLASS: &str = "wm-blocker";

pub struct DomHost {
    window: Window,
    document: Document,
    on_title: Rc<dyn Fn()>,
}

impl DomHost {
    /// `on_title` runs after every title mutation batch.
    pub fn new(on_title: Rc<dyn Fn()>) -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            on_title,
        })
    }

    pub fn url(&self) -> Option<String> {
        self.window.location().href().ok()
    }

    /// Run `handler` on every window resize until the subscription drops.
    pub fn observe_resize(&self, handler: Rc<dyn Fn()>) -> Subscription {
        let closure = Closure::<dyn FnMut()>::new(move || handler());
        let window = self.window.clone();
        if window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
            .is_err()
        {
            return Subscription::noop();
        }
        Subscription::new(move || {
            let _ = window
                .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            drop(closure);
        })
    }

    fn overlay_root(&self) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(OVERLAY_ROOT_ID)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn create_html(&self, tag: &str) -> Option<HtmlElement> {
        self.document
            .create_element(tag)
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()
    }
}

fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) {
    let style = element.style();
    for (name, value) in styles {
        let _ = style.set_property(name, value);
    }
}

fn px(value: f64) -> String {
    format!("{}px", fmt_num(value))
}

impl PageHost for DomHost {
    type Element = Element;

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_str(&self.document.ready_state())
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn bounding_rect(&self, element: &Element) -> ViewportRect {
        let rect = element.get_bounding_client_rect();
        ViewportRect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn scroll_offset(&self) -> ScrollOffset {
        ScrollOffset {
            x: self.window.scroll_x().unwrap_or(0.0),
            y: self.window.scroll_y().unwrap_or(0.0),
        }
    }

    fn viewport_size(&self) -> DocumentSize {
        match self.document.document_element() {
            Some(root) => DocumentSize::new(root.client_width() as f64, root.client_height() as f64),
            None => DocumentSize::default(),
        }
    }

    fn scroll_size(&self) -> DocumentSize {
        let mut size = match self.document.document_element() {
            Some(root) => DocumentSize::new(root.scroll_width() as f64, root.scroll_height() as f64),
            None => DocumentSize::default(),
        };
        if let Some(body) = self.document.body() {
            size = size.max(DocumentSize::new(body.scroll_width() as f64, body.scroll_height() as f64));
        }
        size
    }

    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&mut self, title: &str) {
        self.document.set_title(title);
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&mut self, element: &Element, name: &str, value: &str) {
        let _ = element.set_attribute(name, value);
    }

    fn rewrite_text_nodes(
        &mut self,
        element: &Element,
        rewrite: &mut dyn FnMut(&str) -> Option<String>,
    ) -> usize {
        let Ok(walker) = self.document.create_tree_walker_with_what_to_show(element, SHOW_TEXT) else {
            return 0;
        };

        let mut changed = 0;
        while let Ok(Some(node)) = walker.next_node() {
            let Some(text) = node.node_value() else {
                continue;
            };
            if let Some(next) = rewrite(&text) {
                node.set_node_value(Some(&next));
                changed += 1;
            }
        }
        changed
    }

    fn icon_links(&self) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(ICON_LINK_SELECTOR) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn append_icon_link(&mut self, href: &str) -> bool {
        let Some(head) = self.document.head() else {
            return false;
        };
        let Ok(link) = self.document.create_element("link") else {
            return false;
        };
        let _ = link.set_attribute("rel", "icon");
        let _ = link.set_attribute("href", href);
        head.append_child(&link).is_ok()
    }

    fn ensure_overlay_root(&mut self, size: DocumentSize) {
        let root = match self.overlay_root() {
            Some(root) => root,
            None => {
                let (Some(root), Some(parent)) = (self.create_html("div"), self.document.document_element())
                else {
                    log::warn!("cannot create overlay root");
                    return;
                };
                root.set_id(OVERLAY_ROOT_ID);
                if parent.append_child(&root).is_err() {
                    return;
                }
                root
            }
        };

        set_styles(
            &root,
            &[
                ("position", "absolute"),
                ("left", "0"),
                ("top", "0"),
                ("width", &px(size.width)),
                ("height", &px(size.height)),
                ("pointer-events", "none"),
                ("z-index", "2147483647"),
            ],
        );
    }

    fn clear_overlay(&mut self) {
        if let Some(root) = self.overlay_root() {
            root.set_inner_html("");
        }
    }

    fn paint_overlay(&mut self, paint: &Paint) {
        let (Some(root), Some(blocker)) = (self.overlay_root(), self.create_html("div")) else {
            return;
        };
        blocker.set_class_name(BLOCKER_CLASS);

        let filter = paint.filter().to_string();
        set_styles(
            &blocker,
            &[
                ("position", "absolute"),
                ("left", "0"),
                ("top", "0"),
                ("pointer-events", "none"),
                ("backdrop-filter", &filter),
                ("-webkit-backdrop-filter", &filter),
            ],
        );

        match paint {
            Paint::Masked { mask, .. } => {
                set_styles(
                    &blocker,
                    &[
                        ("width", &px(mask.size.width)),
                        ("height", &px(mask.size.height)),
                        ("background", "transparent"),
                        ("clip-path", &mask.css_clip_path()),
                    ],
                );
            }
            Paint::Opaque { size, fill, .. } => {
                set_styles(
                    &blocker,
                    &[
                        ("width", &px(size.width)),
                        ("height", &px(size.height)),
                        ("background", fill),
                    ],
                );
            }
        }

        let _ = root.append_child(&blocker);
    }

    fn install_hide_style(&mut self) {
        if self.document.get_element_by_id(HIDE_STYLE_ID).is_some() {
            return;
        }
        let (Ok(style), Some(parent)) = (
            self.document.create_element("style"),
            self.document.document_element(),
        ) else {
            return;
        };
        style.set_id(HIDE_STYLE_ID);
        style.set_text_content(Some(HIDE_STYLE_CSS));
        let _ = parent.append_child(&style);
    }

    fn remove_hide_style(&mut self) {
        if let Some(style) = self.document.get_element_by_id(HIDE_STYLE_ID) {
            style.remove();
        }
    }

    fn observe_title(&mut self) -> Subscription {
        let target: Option<Element> = match self.document.head() {
            Some(head) => Some(head.into()),
            None => self.document.document_element(),
        };
        let Some(target) = target else {
            return Subscription::noop();
        };

        let on_title = self.on_title.clone();
        let closure = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| on_title(),
        );
        let Ok(observer) = MutationObserver::new(closure.as_ref().unchecked_ref()) else {
            return Subscription::noop();
        };

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_character_data(true);
        init.set_subtree(true);
        if observer.observe_with_options(&target, &init).is_err() {
            return Subscription::noop();
        }

        Subscription::new(move || {
            observer.disconnect();
            drop(closure);
        })
    }
}
