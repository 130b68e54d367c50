//! WASM bindings for the `cotcraft` frame transcoder.
//!
//! The schema and the lookup tables are passed as JSON documents (see
//! `cotcraft::serde` for their shape) and compiled once. Events cross the
//! boundary as plain JavaScript objects:
//!
//! ```text
//! // const interp = new WasmInterpreter(schemaJson, tablesJson);
//! // const len = interp.expectedLength(bytes);
//! // const event = interp.decode(bytes.subarray(0, len));
//! // // event = { uid, type, how, time, start, stale, point: {...}, detail: {...} }
//! // const frame = interp.encode(event);
//! ```
//!
//! Errors are thrown as strings carrying the library's error message.

mod convert;

use cotcraft::Interpreter;
use wasm_bindgen::prelude::*;

/// A compiled schema plus lookup tables, usable from JavaScript.
#[wasm_bindgen]
pub struct WasmInterpreter {
    inner: Interpreter,
}

#[wasm_bindgen]
impl WasmInterpreter {
    /// Compiles the schema document and builds the lookup tables.
    #[wasm_bindgen(constructor)]
    pub fn new(schema_json: &str, tables_json: &str) -> Result<WasmInterpreter, JsValue> {
        let inner = Interpreter::from_json(schema_json, tables_json).map_err(convert::error_to_js)?;
        Ok(WasmInterpreter { inner })
    }

    /// Decodes one complete frame into an event object.
    pub fn decode(&self, data: &[u8]) -> Result<JsValue, JsValue> {
        let event = self.inner.decode(data).map_err(convert::error_to_js)?;
        convert::event_to_js(&event)
    }

    /// Encodes an event object into a frame.
    pub fn encode(&self, event: JsValue) -> Result<Vec<u8>, JsValue> {
        let event = convert::event_from_js(event)?;
        self.inner.encode(&event).map_err(convert::error_to_js)
    }

    /// Length of the frame at the start of `data`; throws while more bytes are needed.
    #[wasm_bindgen(js_name = expectedLength)]
    pub fn expected_length(&self, data: &[u8]) -> Result<usize, JsValue> {
        self.inner.expected_length(data).map_err(convert::error_to_js)
    }
}
