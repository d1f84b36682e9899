//! # timer_bridge
//!
//! Host-side glue for the timer web app: the compiled application is mounted
//! with flags decoded from the page URL, and its two outbound message streams
//! (query-string updates and analytics events) are relayed to the browser.
//!
//! Everything here is plain Rust so it can be unit-tested on the host; the
//! browser bindings live in the `timer_web` crate.
//!
//! ## Quick Start
//!
//! ```
//! use timer_bridge::flags::{parse_init_flags, InitRange};
//!
//! let flags = parse_init_flags(
//!     "https://timer.example/?fg=%23ab12cd&init=31",
//!     Some(InitRange::default()),
//! );
//! assert_eq!(flags.fg.as_deref(), Some("#ab12cd"));
//! assert_eq!(flags.init, None); // outside [-30, 30]
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod flags;
pub mod location;
pub mod survey;

pub use bridge::{
    start, AddressBar, AnalyticsSink, Application, ApplicationHandle, BootstrapBridge,
    MessageHandler, Started, SurveyTransport,
};
pub use config::{BridgeConfig, ServiceWorkerPolicy};
pub use error::{BridgeError, Result};
pub use event::{AnalyticsEvent, AnalyticsPayload};
pub use flags::{InitFlags, InitRange};
pub use location::PageLocation;
pub use survey::SurveyEndpoint;
