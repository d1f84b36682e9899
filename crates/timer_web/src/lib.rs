//! Browser bootstrap for the timer app.
//!
//! This crate is a stub by default so the workspace builds on native targets
//! without a wasm toolchain. The real bootstrap is behind `--features web` on
//! `wasm32`; it exports `startApp(module, options)` for the host page:
//!
//! ```js
//! import init, { startApp } from "./pkg/timer_web.js";
//! import { Elm } from "./Main.elm";
//!
//! await init();
//! startApp(Elm.Main, { surveyUrl: "https://survey.example/ping" });
//! ```

pub use timer_bridge;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::start_app;
