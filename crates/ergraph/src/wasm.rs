//! WebAssembly bindings
//!
//! Browser-facing wrappers around export, module-group listing and width
//! validation. Errors are returned to JavaScript as thrown strings.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::core::parse_width;
#[cfg(target_arch = "wasm32")]
use crate::model::{DiagramPayload, DisplayModeRegistry};
#[cfg(target_arch = "wasm32")]
use crate::source::module_groups as payload_module_groups;

/// Initialize WASM module
///
/// Sets up the panic hook and routes tracing output to the browser console.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

/// Export a diagram payload (JSON) to draw.io XML
///
/// # Arguments
/// * `payload_json` - `{ "nodes": [...], "edges": [...] }`
/// * `display_mode` - display mode name; the default mode when omitted
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn export_drawio(payload_json: &str, display_mode: Option<String>) -> Result<String, JsValue> {
    crate::export_drawio(payload_json, display_mode.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Names of the built-in display modes as a JSON array
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn display_mode_names() -> Result<String, JsValue> {
    let registry = DisplayModeRegistry::builtin();
    serde_json::to_string(&registry.names()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Distinct module groups of a payload as a JSON array
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn module_groups(payload_json: &str) -> Result<String, JsValue> {
    let payload =
        DiagramPayload::from_json(payload_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&payload_module_groups(&payload.nodes))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate width input; throws the user-facing notice when rejected
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn validate_width(input: &str) -> Result<u32, JsValue> {
    parse_width(input).map_err(|e| JsValue::from_str(&e.to_string()))
}
