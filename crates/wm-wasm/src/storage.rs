//! `chrome.storage.sync` access.

use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use wm_compiler::STORAGE_KEY;

pub(crate) fn js_err(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn get_path(root: &JsValue, path: &[&str]) -> Result<JsValue, String> {
    let mut value = root.clone();
    for key in path {
        if value.is_null() || value.is_undefined() {
            return Err(format!("{} is not available", path.join(".")));
        }
        value = Reflect::get(&value, &JsValue::from_str(key)).map_err(js_err)?;
    }
    Ok(value)
}

/// Read the raw stored rule list. The value under [`STORAGE_KEY`] is returned
/// as-is; an absent key yields `null`.
pub async fn fetch_stored_rules() -> Result<serde_json::Value, String> {
    let global: JsValue = js_sys::global().into();
    let area = get_path(&global, &["chrome", "storage", "sync"])?;
    let get = get_path(&area, &["get"])?
        .dyn_into::<Function>()
        .map_err(|_| "chrome.storage.sync.get is not a function".to_string())?;

    let keys = Array::of1(&JsValue::from_str(STORAGE_KEY));
    let pending = get
        .call1(&area, &keys)
        .map_err(js_err)?
        .dyn_into::<Promise>()
        .map_err(|_| "storage.get did not return a promise".to_string())?;
    let items = JsFuture::from(pending).await.map_err(js_err)?;

    let items = items
        .dyn_into::<Object>()
        .map_err(|_| "storage.get resolved to a non-object".to_string())?;
    let stored = Reflect::get(&items, &JsValue::from_str(STORAGE_KEY)).map_err(js_err)?;
    if stored.is_undefined() || stored.is_null() {
        return Ok(serde_json::Value::Null);
    }

    serde_wasm_bindgen::from_value(stored).map_err(|e| e.to_string())
}
