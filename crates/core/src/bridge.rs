//! The bootstrap bridge: mounts the application and relays its two outbound
//! message streams to the host.
//!
//! Host capabilities (address bar, analytics sink, survey transport) and the
//! application itself are traits, so the same flow runs in the browser and in
//! native tests.

use std::rc::Rc;

use url::Url;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::event::{AnalyticsEvent, AnalyticsPayload};
use crate::flags::{parse_query, InitFlags};
use crate::location::PageLocation;
use crate::survey::SurveyEndpoint;

/// Read and replace the page address without navigating.
pub trait AddressBar {
    fn location(&self) -> Result<PageLocation>;
    /// Replace the current history entry with `url`.
    fn replace(&self, url: &str) -> Result<()>;
}

/// Destination for named analytics events.
pub trait AnalyticsSink {
    /// Whether the sink can take events right now. Third-party tags load
    /// asynchronously, so this is checked per event.
    fn available(&self) -> bool;
    fn record(&self, name: &str, payload: &AnalyticsPayload) -> Result<()>;
}

/// Fire-and-forget GET. Implementations observe completion for logging only.
pub trait SurveyTransport {
    fn send(&self, url: Url);
}

impl<T: AddressBar + ?Sized> AddressBar for Rc<T> {
    fn location(&self) -> Result<PageLocation> {
        (**self).location()
    }

    fn replace(&self, url: &str) -> Result<()> {
        (**self).replace(url)
    }
}

impl<T: AnalyticsSink + ?Sized> AnalyticsSink for Rc<T> {
    fn available(&self) -> bool {
        (**self).available()
    }

    fn record(&self, name: &str, payload: &AnalyticsPayload) -> Result<()> {
        (**self).record(name, payload)
    }
}

impl<T: SurveyTransport + ?Sized> SurveyTransport for Rc<T> {
    fn send(&self, url: Url) {
        (**self).send(url)
    }
}

pub type MessageHandler = Box<dyn FnMut(String)>;

/// The mounted application's outbound ports.
///
/// Subscriptions return `false` when the application does not expose the
/// port.
pub trait ApplicationHandle {
    fn subscribe_query_string(&self, handler: MessageHandler) -> bool;
    fn subscribe_analytics(&self, handler: MessageHandler) -> bool;
}

/// The compiled application, treated as an opaque collaborator.
pub trait Application {
    type Handle: ApplicationHandle;

    /// Attach to the element with id `mount_id`, passing `flags` once.
    fn init(&self, mount_id: &str, flags: &InitFlags) -> Result<Self::Handle>;
}

pub struct BootstrapBridge<B, S, T> {
    address_bar: B,
    sink: S,
    transport: T,
    survey: Option<SurveyEndpoint>,
}

impl<B, S, T> BootstrapBridge<B, S, T>
where
    B: AddressBar + 'static,
    S: AnalyticsSink + 'static,
    T: SurveyTransport + 'static,
{
    pub fn new(address_bar: B, sink: S, transport: T) -> Self {
        Self {
            address_bar,
            sink,
            transport,
            survey: None,
        }
    }

    pub fn with_survey(mut self, survey: Option<SurveyEndpoint>) -> Self {
        self.survey = survey;
        self
    }

    pub fn address_bar(&self) -> &B {
        &self.address_bar
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mount `app` and subscribe both handlers to its ports.
    pub fn mount<A: Application>(
        bridge: &Rc<Self>,
        app: &A,
        mount_id: &str,
        flags: &InitFlags,
    ) -> Result<A::Handle> {
        let handle = app.init(mount_id, flags)?;
        tracing::info!(mount_id, ?flags, "application mounted");

        let b = Rc::clone(bridge);
        if !handle.subscribe_query_string(Box::new(move |qs| b.on_query_string_update(&qs))) {
            tracing::debug!("application has no query string port");
        }
        let b = Rc::clone(bridge);
        if !handle.subscribe_analytics(Box::new(move |raw| b.on_analytics_event(&raw))) {
            tracing::debug!("application has no analytics port");
        }
        Ok(handle)
    }

    pub fn on_query_string_update(&self, query: &str) {
        let loc = match self.address_bar.location() {
            Ok(loc) => loc,
            Err(e) => {
                tracing::warn!(error = %e, "query string update dropped");
                return;
            }
        };
        let url = loc.with_query(query);
        if let Err(e) = self.address_bar.replace(&url) {
            tracing::warn!(error = %e, %url, "history replace failed");
        }
    }

    pub fn on_analytics_event(&self, raw: &str) {
        match AnalyticsEvent::decode(raw) {
            Ok(event) => self.dispatch(&event),
            Err(e) => tracing::warn!(error = %e, "analytics event dropped"),
        }
    }

    pub fn dispatch(&self, event: &AnalyticsEvent) {
        tracing::debug!(
            category = %event.category,
            action = %event.action,
            label = ?event.label,
            value = ?event.value,
            extra = ?event.extra,
            "analytics event"
        );

        if self.sink.available() {
            if let Err(e) = self.sink.record(&event.action, &event.payload()) {
                tracing::warn!(error = %e, action = %event.action, "analytics sink failed");
            }
        } else {
            tracing::trace!(action = %event.action, "no analytics sink");
        }

        if let Some(url) = self.survey.as_ref().and_then(|s| s.ping_url(event)) {
            tracing::debug!(%url, "survey ping");
            self.transport.send(url);
        }
    }
}

/// Result of [`start`].
pub struct Started<H, B, S, T> {
    pub bridge: Rc<BootstrapBridge<B, S, T>>,
    pub handle: H,
    pub flags: InitFlags,
}

/// Page-load sequence: read the address, parse flags, build the bridge and
/// mount `app`.
///
/// An unreadable location degrades to empty flags and a bad survey URL
/// disables the ping; only a failed mount is returned as an error.
pub fn start<A, B, S, T>(
    config: &BridgeConfig,
    app: &A,
    address_bar: B,
    sink: S,
    transport: T,
) -> Result<Started<A::Handle, B, S, T>>
where
    A: Application,
    B: AddressBar + 'static,
    S: AnalyticsSink + 'static,
    T: SurveyTransport + 'static,
{
    let flags = match address_bar.location() {
        Ok(loc) => parse_query(&loc.search, config.init_range),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read page location; starting without flags");
            InitFlags::default()
        }
    };

    let survey = config.survey_endpoint().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "survey ping disabled");
        None
    });

    let bridge = Rc::new(BootstrapBridge::new(address_bar, sink, transport).with_survey(survey));
    let handle = BootstrapBridge::mount(&bridge, app, &config.mount_id, &flags)?;
    Ok(Started {
        bridge,
        handle,
        flags,
    })
}
