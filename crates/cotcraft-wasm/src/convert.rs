use std::fmt::Display;

use cotcraft::Event;
use wasm_bindgen::JsValue;

/// Surfaces any library error to JavaScript as its message string.
pub fn error_to_js<E: Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub fn event_to_js(event: &Event) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(event).map_err(error_to_js)
}

pub fn event_from_js(value: JsValue) -> Result<Event, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(error_to_js)
}
