use js_sys::Reflect;
use timer_bridge::{BridgeError, Result, ServiceWorkerPolicy};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::browser::{js_error, window};

/// Apply the service worker policy in the background.
pub(super) fn apply(policy: &ServiceWorkerPolicy) {
    match policy {
        ServiceWorkerPolicy::Leave => tracing::debug!("service worker left as-is"),
        ServiceWorkerPolicy::Unregister => wasm_bindgen_futures::spawn_local(async {
            match unregister().await {
                Ok(true) => tracing::info!("service worker unregistered"),
                Ok(false) => tracing::debug!("no service worker to unregister"),
                Err(e) => tracing::warn!(error = %e, "service worker unregister failed"),
            }
        }),
        ServiceWorkerPolicy::Register(script) => {
            let script = script.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match register(&script).await {
                    Ok(()) => tracing::info!(%script, "service worker registered"),
                    Err(e) => tracing::warn!(error = %e, %script, "service worker register failed"),
                }
            });
        }
    }
}

fn container() -> Result<Option<web_sys::ServiceWorkerContainer>> {
    let navigator = window()?.navigator();
    // Absent outside secure contexts.
    let supported = Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))
        .map_err(|e| js_error("navigator", e))?;
    Ok(supported.then(|| navigator.service_worker()))
}

/// Resolves once the active registration (if any) is gone. Like the usual
/// `ready.then(r => r.unregister())`, this stays pending when no worker was
/// ever registered.
async fn unregister() -> Result<bool> {
    let Some(container) = container()? else {
        return Ok(false);
    };
    let ready = container.ready().map_err(|e| js_error("serviceWorker.ready", e))?;
    let registration = JsFuture::from(ready)
        .await
        .map_err(|e| js_error("serviceWorker.ready", e))?
        .dyn_into::<web_sys::ServiceWorkerRegistration>()
        .map_err(|_| BridgeError::host("serviceWorker.ready", "expected a registration"))?;
    let done = registration
        .unregister()
        .map_err(|e| js_error("unregister", e))?;
    let removed = JsFuture::from(done)
        .await
        .map_err(|e| js_error("unregister", e))?;
    Ok(removed.as_bool().unwrap_or(false))
}

async fn register(script: &str) -> Result<()> {
    let Some(container) = container()? else {
        return Err(BridgeError::host("serviceWorker", "not supported"));
    };
    JsFuture::from(container.register(script))
        .await
        .map(|_| ())
        .map_err(|e| js_error("serviceWorker.register", e))
}
