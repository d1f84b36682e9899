use timer_bridge::{AddressBar, BridgeError, PageLocation, Result};
use wasm_bindgen::JsValue;

pub(super) fn js_error(context: &str, err: JsValue) -> BridgeError {
    let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    BridgeError::host(context, message)
}

pub(super) fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| BridgeError::host("window", "no window"))
}

/// `window.location` / `window.history` of the current page.
pub(super) struct WindowAddressBar;

impl AddressBar for WindowAddressBar {
    fn location(&self) -> Result<PageLocation> {
        let href = window()?
            .location()
            .href()
            .map_err(|e| js_error("location.href", e))?;
        PageLocation::parse(&href)
    }

    fn replace(&self, url: &str) -> Result<()> {
        window()?
            .history()
            .map_err(|e| js_error("history", e))?
            .replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(|e| js_error("history.replaceState", e))
    }
}
