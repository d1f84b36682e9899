use timer_bridge::{BridgeError, Result, SurveyTransport};
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::browser::{js_error, window};

/// `fetch` GET, spawned on the microtask queue. Outcome is logged only.
pub(super) struct FetchTransport;

impl SurveyTransport for FetchTransport {
    fn send(&self, url: Url) {
        wasm_bindgen_futures::spawn_local(async move {
            match fetch(url.as_str()).await {
                Ok(status) => tracing::info!(status, "survey ping sent"),
                Err(e) => tracing::warn!(error = %e, "survey ping failed"),
            }
        });
    }
}

async fn fetch(url: &str) -> Result<u16> {
    let promise = window()?.fetch_with_str(url);
    let resp = JsFuture::from(promise)
        .await
        .map_err(|e| js_error("fetch", e))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| BridgeError::host("fetch", "expected Response"))?;

    if !resp.ok() {
        return Err(BridgeError::host(
            "fetch",
            format!("status {}", resp.status()),
        ));
    }
    Ok(resp.status())
}
