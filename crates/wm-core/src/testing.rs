//! In-memory page used by the unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::host::{PageHost, ReadyState, Subscription};
use crate::overlay::Paint;
use crate::types::{DocumentSize, ScrollOffset, ViewportRect};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HostEvent {
    EnsureRoot,
    ClearOverlay,
    Paint,
    InstallHideStyle,
    RemoveHideStyle,
    SetTitle(String),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeElement {
    pub selector: String,
    pub rect: ViewportRect,
    pub texts: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub is_icon: bool,
}

pub(crate) struct FakeHost {
    pub ready: ReadyState,
    pub elements: Vec<FakeElement>,
    pub scroll: ScrollOffset,
    pub viewport: DocumentSize,
    pub scroll_size: DocumentSize,
    pub title: String,
    pub has_head: bool,
    pub hide_style: bool,
    pub overlay_size: Option<DocumentSize>,
    pub painted: Vec<Paint>,
    pub events: Vec<HostEvent>,
    pub title_watchers: Rc<Cell<usize>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            ready: ReadyState::Complete,
            elements: Vec::new(),
            scroll: ScrollOffset::default(),
            viewport: DocumentSize::new(1280.0, 720.0),
            scroll_size: DocumentSize::new(1280.0, 3000.0),
            title: String::new(),
            has_head: true,
            hide_style: false,
            overlay_size: None,
            painted: Vec::new(),
            events: Vec::new(),
            title_watchers: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_element(self, selector: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.with_text_element(selector, left, top, width, height, &[])
    }

    pub fn with_text_element(
        mut self,
        selector: &str,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        texts: &[&str],
    ) -> Self {
        self.elements.push(FakeElement {
            selector: selector.to_string(),
            rect: ViewportRect { left, top, width, height },
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ..FakeElement::default()
        });
        self
    }

    pub fn with_icon(mut self, href: &str) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("href".to_string(), href.to_string());
        self.elements.push(FakeElement {
            selector: "link[rel=icon]".to_string(),
            attributes,
            is_icon: true,
            ..FakeElement::default()
        });
        self
    }

    pub fn find(&self, selector: &str) -> &FakeElement {
        self.elements
            .iter()
            .find(|e| e.selector == selector)
            .expect("element should exist")
    }

    pub fn icon_hrefs(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter(|e| e.is_icon)
            .filter_map(|e| e.attributes.get("href").cloned())
            .collect()
    }
}

impl PageHost for FakeHost {
    type Element = usize;

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn query_selector(&self, selector: &str) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| !e.is_icon && e.selector == selector)
    }

    fn bounding_rect(&self, element: &usize) -> ViewportRect {
        self.elements[*element].rect
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn viewport_size(&self) -> DocumentSize {
        self.viewport
    }

    fn scroll_size(&self) -> DocumentSize {
        self.scroll_size
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.events.push(HostEvent::SetTitle(title.to_string()));
    }

    fn attribute(&self, element: &usize, name: &str) -> Option<String> {
        self.elements[*element].attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, element: &usize, name: &str, value: &str) {
        self.elements[*element]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn rewrite_text_nodes(
        &mut self,
        element: &usize,
        rewrite: &mut dyn FnMut(&str) -> Option<String>,
    ) -> usize {
        let mut changed = 0;
        for text in &mut self.elements[*element].texts {
            if let Some(next) = rewrite(text) {
                *text = next;
                changed += 1;
            }
        }
        changed
    }

    fn icon_links(&self) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_icon)
            .map(|(i, _)| i)
            .collect()
    }

    fn append_icon_link(&mut self, href: &str) -> bool {
        if !self.has_head {
            return false;
        }
        let mut attributes = HashMap::new();
        attributes.insert("href".to_string(), href.to_string());
        self.elements.push(FakeElement {
            selector: "link[rel=icon]".to_string(),
            attributes,
            is_icon: true,
            ..FakeElement::default()
        });
        true
    }

    fn ensure_overlay_root(&mut self, size: DocumentSize) {
        self.overlay_size = Some(size);
        self.events.push(HostEvent::EnsureRoot);
    }

    fn clear_overlay(&mut self) {
        self.painted.clear();
        self.events.push(HostEvent::ClearOverlay);
    }

    fn paint_overlay(&mut self, paint: &Paint) {
        self.painted.push(paint.clone());
        self.events.push(HostEvent::Paint);
    }

    fn install_hide_style(&mut self) {
        self.hide_style = true;
        self.events.push(HostEvent::InstallHideStyle);
    }

    fn remove_hide_style(&mut self) {
        self.hide_style = false;
        self.events.push(HostEvent::RemoveHideStyle);
    }

    fn observe_title(&mut self) -> Subscription {
        let watchers = self.title_watchers.clone();
        watchers.set(watchers.get() + 1);
        Subscription::new(move || watchers.set(watchers.get() - 1))
    }
}
