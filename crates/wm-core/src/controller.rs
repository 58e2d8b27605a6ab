//! Page lifecycle orchestration
//!
//! One controller exists per page load. The host drives it through a fixed
//! sequence: [`begin`](PageController::begin) as early as possible,
//! [`load_rules`](PageController::load_rules) once storage answers,
//! [`render`](PageController::render) when the document is ready, then
//! [`on_title_mutated`](PageController::on_title_mutated) and
//! [`on_resize`](PageController::on_resize) as events arrive.

use crate::geometry::collect_rule_rects;
use crate::host::{PageHost, Subscription};
use crate::matcher::Matcher;
use crate::overlay::{OverlayRenderer, Paint};
use crate::rewrite::{rewrite_content, rewrite_icon, TitleRewriter};
use crate::types::Rule;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for rules
    Pending,
    /// A rule was selected; waiting for the document
    Selected,
    /// At least one render happened
    Rendered,
    /// No rule applies (or rules could not be read); nothing more to do
    Inactive,
}

pub struct PageController<H: PageHost> {
    host: H,
    matcher: Matcher,
    overlay: OverlayRenderer,
    rule: Option<Rule>,
    title: Option<TitleRewriter>,
    title_watch: Option<Subscription>,
    phase: Phase,
}

impl<H: PageHost> PageController<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            matcher: Matcher::new(),
            overlay: OverlayRenderer::new(),
            rule: None,
            title: None,
            title_watch: None,
            phase: Phase::Pending,
        }
    }

    /// Hide the page until a render or a "no rule" decision.
    pub fn begin(&mut self) {
        self.overlay.install_hide(&mut self.host);
    }

    /// Select the rule for `url`. Returns the selected rule, if any.
    ///
    /// Without a match the page is revealed immediately. With one, the title
    /// and favicon are rewritten right away and title observation starts.
    pub fn load_rules(&mut self, rules: &[Rule], url: &str) -> Option<&Rule> {
        let Some(rule) = self.matcher.select(rules, url).cloned() else {
            log::debug!("no rule for {}", url);
            self.deactivate();
            return None;
        };

        self.title = TitleRewriter::for_rule(&rule);
        if let Some(title) = self.title.as_mut() {
            title.apply(&mut self.host);
            self.title_watch = Some(self.host.observe_title());
        }
        rewrite_icon(&mut self.host, &rule);

        self.phase = Phase::Selected;
        self.rule = Some(rule);
        self.rule.as_ref()
    }

    /// Rule storage could not be read: behave as if nothing matched.
    pub fn fail(&mut self) {
        self.rule = None;
        self.deactivate();
    }

    /// Render the selected rule. Returns false when there is nothing to render.
    pub fn render(&mut self) -> bool {
        let Some(rule) = self.rule.as_ref() else {
            return false;
        };

        let rects = collect_rule_rects(&self.host, rule);
        rewrite_content(&mut self.host, rule);
        if let Some(title) = self.title.as_mut() {
            title.apply(&mut self.host);
        }
        rewrite_icon(&mut self.host, rule);

        let size = self.host.document_size();
        self.overlay.render(&mut self.host, rule, &rects, size);
        self.phase = Phase::Rendered;
        true
    }

    /// Render now if the document is ready. Returns false when the caller
    /// must wait for the ready signal.
    pub fn render_when_ready(&mut self) -> bool {
        if !self.host.ready_state().is_ready() {
            return false;
        }
        self.render();
        true
    }

    /// The page changed its title.
    pub fn on_title_mutated(&mut self) {
        if let Some(title) = self.title.as_mut() {
            title.apply(&mut self.host);
        }
    }

    /// Viewport size changed; re-render if a mask is on screen.
    pub fn on_resize(&mut self) {
        if self.phase == Phase::Rendered {
            self.render();
        }
    }

    /// Stop observing the page.
    pub fn dispose(&mut self) {
        if let Some(watch) = self.title_watch.take() {
            watch.unsubscribe();
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    pub fn last_paint(&self) -> Option<&Paint> {
        self.overlay.last_paint()
    }

    pub fn is_observing_title(&self) -> bool {
        self.title_watch.is_some()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn deactivate(&mut self) {
        self.dispose();
        self.title = None;
        self.overlay.lift_hide(&mut self.host);
        self.phase = Phase::Inactive;
    }
}
