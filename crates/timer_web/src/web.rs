use timer_bridge::{BridgeConfig, BridgeError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod browser;
mod console;
mod elm;
mod gtag;
mod service_worker;
mod survey;

use browser::WindowAddressBar;
use elm::ElmApplication;
use gtag::GtagSink;
use survey::FetchTransport;

/// Mount `module` (a compiled Elm module such as `Elm.Main`) and wire its
/// ports to the page.
///
/// `options` may be `undefined` or an object with any of `surveyUrl`,
/// `mountId`, `initRange`, `serviceWorker`, `logLevel`. Rejects only when the
/// mount point is missing or the module fails to initialize.
#[wasm_bindgen(js_name = startApp)]
pub fn start_app(module: JsValue, options: JsValue) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let (config, config_err) = load_config(&options);
    console::init_logging(&config.log_level);
    if let Some(e) = config_err {
        tracing::warn!(error = %e, "ignoring startApp options");
    }
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "config");
    }

    let app = ElmApplication::new(module.unchecked_into());
    let started = timer_bridge::start(
        &config,
        &app,
        WindowAddressBar,
        GtagSink,
        FetchTransport,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "startup failed");
        JsValue::from_str(&e.to_string())
    })?;

    if started.flags.is_empty() {
        tracing::debug!("no flags in query string");
    }

    service_worker::apply(&config.service_worker);
    Ok(())
}

fn load_config(options: &JsValue) -> (BridgeConfig, Option<BridgeError>) {
    let config = BridgeConfig::default().with_env_survey_url(option_env!("TIMER_SURVEY_URL"));
    if options.is_undefined() || options.is_null() {
        return (config, None);
    }

    let raw = match js_sys::JSON::stringify(options) {
        Ok(s) => s.as_string().unwrap_or_default(),
        Err(e) => return (config, Some(browser::js_error("options", e))),
    };
    match config.clone().merge_json(&raw) {
        Ok(merged) => (merged, None),
        Err(e) => (config, Some(e)),
    }
}
