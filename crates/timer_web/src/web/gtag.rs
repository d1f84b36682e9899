use js_sys::{Function, Reflect};
use timer_bridge::{AnalyticsPayload, AnalyticsSink, BridgeError, Result};
use wasm_bindgen::{JsCast, JsValue};

use super::browser::js_error;

/// The page's global `gtag` function, looked up on every call since the tag
/// script loads asynchronously.
pub(super) struct GtagSink;

fn gtag() -> Option<Function> {
    Reflect::get(&js_sys::global(), &JsValue::from_str("gtag"))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

impl AnalyticsSink for GtagSink {
    fn available(&self) -> bool {
        gtag().is_some()
    }

    fn record(&self, name: &str, payload: &AnalyticsPayload) -> Result<()> {
        let f = gtag().ok_or_else(|| BridgeError::host("gtag", "not loaded"))?;
        let json = serde_json::to_string(payload)
            .map_err(|e| BridgeError::host("gtag payload", e.to_string()))?;
        let params = js_sys::JSON::parse(&json).map_err(|e| js_error("gtag payload", e))?;
        f.call3(
            &JsValue::UNDEFINED,
            &JsValue::from_str("event"),
            &JsValue::from_str(name),
            &params,
        )
        .map(|_| ())
        .map_err(|e| js_error("gtag", e))
    }
}
