//! Bindings for a compiled Elm module and its ports.

use js_sys::{Object, Reflect};
use timer_bridge::{Application, ApplicationHandle, BridgeError, InitFlags, MessageHandler, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::browser::{js_error, window};

pub(super) const QUERY_STRING_PORT: &str = "setQueryString";
pub(super) const ANALYTICS_PORT: &str = "sendAnalyticsEvent";

#[wasm_bindgen]
extern "C" {
    /// `Elm.<Module>` as emitted by the Elm compiler.
    pub type ElmModule;

    #[wasm_bindgen(method, catch)]
    fn init(this: &ElmModule, options: &Object) -> std::result::Result<ElmApp, JsValue>;

    pub type ElmApp;

    #[wasm_bindgen(method, getter)]
    fn ports(this: &ElmApp) -> JsValue;

    type ElmPort;

    #[wasm_bindgen(method, catch)]
    fn subscribe(this: &ElmPort, callback: &js_sys::Function) -> std::result::Result<(), JsValue>;
}

pub(super) struct ElmApplication {
    module: ElmModule,
}

impl ElmApplication {
    pub(super) fn new(module: ElmModule) -> Self {
        Self { module }
    }
}

impl Application for ElmApplication {
    type Handle = ElmHandle;

    fn init(&self, mount_id: &str, flags: &InitFlags) -> Result<ElmHandle> {
        let document = window()?
            .document()
            .ok_or_else(|| BridgeError::host("document", "no document"))?;
        let node = document
            .get_element_by_id(mount_id)
            .ok_or_else(|| BridgeError::MountPointMissing(mount_id.to_string()))?;

        let flags_json =
            serde_json::to_string(flags).map_err(|e| BridgeError::host("flags", e.to_string()))?;
        let flags = js_sys::JSON::parse(&flags_json).map_err(|e| js_error("flags", e))?;

        let options = Object::new();
        set(&options, "node", &node.into())?;
        set(&options, "flags", &flags)?;

        let app = self
            .module
            .init(&options)
            .map_err(|e| js_error("Elm init", e))?;
        Ok(ElmHandle { app })
    }
}

fn set(obj: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(obj, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| js_error("options", e))
}

pub(super) struct ElmHandle {
    app: ElmApp,
}

impl ElmHandle {
    fn port(&self, name: &str) -> Option<ElmPort> {
        let ports = self.app.ports();
        if ports.is_undefined() || ports.is_null() {
            return None;
        }
        let port = Reflect::get(&ports, &JsValue::from_str(name)).ok()?;
        if port.is_undefined() || port.is_null() {
            return None;
        }
        Some(port.unchecked_into())
    }

    fn subscribe_port(&self, name: &'static str, mut handler: MessageHandler) -> bool {
        let Some(port) = self.port(name) else {
            return false;
        };

        let cb = Closure::wrap(Box::new(move |v: JsValue| match v.as_string() {
            Some(s) => handler(s),
            None => tracing::warn!(port = name, "non-string port message dropped"),
        }) as Box<dyn FnMut(JsValue)>);

        match port.subscribe(cb.as_ref().unchecked_ref()) {
            Ok(()) => {
                // The subscription lives as long as the page.
                cb.forget();
                true
            }
            Err(e) => {
                tracing::warn!(port = name, error = %js_error("subscribe", e), "port subscribe failed");
                false
            }
        }
    }
}

impl ApplicationHandle for ElmHandle {
    fn subscribe_query_string(&self, handler: MessageHandler) -> bool {
        self.subscribe_port(QUERY_STRING_PORT, handler)
    }

    fn subscribe_analytics(&self, handler: MessageHandler) -> bool {
        self.subscribe_port(ANALYTICS_PORT, handler)
    }
}
