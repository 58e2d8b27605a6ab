//! WebAssembly content script for WebMask
//!
//! Loaded at `document_start`. The page is hidden immediately, rules are read
//! from `chrome.storage.sync`, and the overlay is painted once the document is
//! interactive.

mod logger;
pub mod host;
mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::AddEventListenerOptions;

use wm_compiler::parse_stored_rules;
use wm_core::substitution::compile_expression;
use wm_core::{select_rule, PageController, Subscription};

use crate::host::DomHost;

thread_local! {
    static CONTROLLER: RefCell<Option<PageController<DomHost>>> = RefCell::new(None);
    static RESIZE_WATCH: RefCell<Option<Subscription>> = RefCell::new(None);
}

/// Run `action` against the page controller. Re-entrant calls (a DOM event
/// delivered while the controller is already busy) are dropped.
fn with_controller<R>(action: impl FnOnce(&mut PageController<DomHost>) -> R) -> Option<R> {
    CONTROLLER.with(|slot| {
        let mut slot = slot.try_borrow_mut().ok()?;
        slot.as_mut().map(action)
    })
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    let on_title: Rc<dyn Fn()> = Rc::new(|| {
        with_controller(|controller| controller.on_title_mutated());
    });
    let Some(host) = DomHost::new(on_title) else {
        log::warn!("no document, content script idle");
        return;
    };

    let mut controller = PageController::new(host);
    controller.begin();
    CONTROLLER.with(|slot| *slot.borrow_mut() = Some(controller));

    spawn_local(run());
}

async fn run() {
    let url = with_controller(|controller| controller.host().url())
        .flatten()
        .unwrap_or_default();

    let raw = match storage::fetch_stored_rules().await {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("failed to read rules: {}", e);
            with_controller(|controller| controller.fail());
            return;
        }
    };

    let parsed = parse_stored_rules(&raw, now_ms());
    if parsed.skipped > 0 {
        log::warn!("skipped {} malformed rule records", parsed.skipped);
    }

    let selected = with_controller(|controller| {
        controller
            .load_rules(&parsed.rules, &url)
            .map(|rule| rule.id.clone())
    })
    .flatten();
    let Some(rule_id) = selected else {
        return;
    };
    log::info!("rule {} applies to this page", rule_id);

    if let Err(e) = schedule_render() {
        log::warn!("cannot schedule render: {}", e);
        with_controller(|controller| controller.fail());
        return;
    }
    watch_resize();
}

/// Render now, or once `DOMContentLoaded` fires. An error means no render
/// will ever happen.
fn schedule_render() -> Result<(), String> {
    if with_controller(|controller| controller.render_when_ready()).unwrap_or(true) {
        return Ok(());
    }

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document".to_string())?;
    let on_ready = Closure::once_into_js(|| {
        with_controller(|controller| controller.render());
    });
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    document
        .add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            on_ready.unchecked_ref(),
            &options,
        )
        .map_err(storage::js_err)
}

fn watch_resize() {
    let on_resize: Rc<dyn Fn()> = Rc::new(|| {
        with_controller(|controller| controller.on_resize());
    });
    let watch = with_controller(|controller| controller.host().observe_resize(on_resize));
    RESIZE_WATCH.with(|slot| *slot.borrow_mut() = watch);
}

/// Re-run the render pass, e.g. after the page injected late content.
#[wasm_bindgen]
pub fn rerender() -> bool {
    with_controller(|controller| controller.render()).unwrap_or(false)
}

/// Stop observing the page and remove every listener.
#[wasm_bindgen]
pub fn dispose() {
    RESIZE_WATCH.with(|slot| slot.borrow_mut().take());
    with_controller(|controller| controller.dispose());
}

/// Id of the rule that would apply to `url`, for the options page preview.
#[wasm_bindgen]
pub fn select_rule_id(stored: JsValue, url: &str) -> Result<Option<String>, JsValue> {
    let raw: serde_json::Value = serde_wasm_bindgen::from_value(stored)
        .map_err(|e| JsValue::from_str(&format!("Invalid rules: {}", e)))?;
    let parsed = parse_stored_rules(&raw, now_ms());
    Ok(select_rule(&parsed.rules, url).map(|rule| rule.id.clone()))
}

/// Apply a `/pattern/replacement/flags` expression to `text`. Returns `None`
/// when the expression is malformed.
#[wasm_bindgen]
pub fn apply_substitution(expression: &str, text: &str) -> Option<String> {
    compile_expression(expression, "").map(|compiled| compiled.apply(text).into_owned())
}
