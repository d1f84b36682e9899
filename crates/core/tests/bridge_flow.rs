use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use timer_bridge::{
    start, AddressBar, AnalyticsPayload, AnalyticsSink, Application, ApplicationHandle,
    BridgeConfig, BridgeError, InitFlags, MessageHandler, PageLocation, Result, SurveyTransport,
};
use url::Url;

struct Page {
    href: RefCell<String>,
    replaced: RefCell<Vec<String>>,
}

impl Page {
    fn at(href: &str) -> Self {
        Self {
            href: RefCell::new(href.to_string()),
            replaced: RefCell::new(Vec::new()),
        }
    }
}

impl AddressBar for Page {
    fn location(&self) -> Result<PageLocation> {
        PageLocation::parse(&self.href.borrow())
    }

    fn replace(&self, url: &str) -> Result<()> {
        *self.href.borrow_mut() = url.to_string();
        self.replaced.borrow_mut().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Gtag {
    loaded: bool,
    calls: RefCell<Vec<(String, AnalyticsPayload)>>,
}

impl AnalyticsSink for Gtag {
    fn available(&self) -> bool {
        self.loaded
    }

    fn record(&self, name: &str, payload: &AnalyticsPayload) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((name.to_string(), payload.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct Network {
    sent: RefCell<Vec<Url>>,
}

impl SurveyTransport for Network {
    fn send(&self, url: Url) {
        self.sent.borrow_mut().push(url);
    }
}

/// Stand-in for the compiled application: records its flags and keeps the
/// subscribed handlers so the test can emit on its ports.
#[derive(Default)]
struct FakeApp {
    dom_ids: Vec<&'static str>,
    with_ports: bool,
}

#[derive(Default)]
struct FakeHandle {
    flags: InitFlags,
    query_port: RefCell<Option<MessageHandler>>,
    analytics_port: RefCell<Option<MessageHandler>>,
    with_ports: bool,
}

impl FakeHandle {
    fn emit_query(&self, qs: &str) {
        if let Some(h) = self.query_port.borrow_mut().as_mut() {
            h(qs.to_string());
        }
    }

    fn emit_event(&self, raw: &str) {
        if let Some(h) = self.analytics_port.borrow_mut().as_mut() {
            h(raw.to_string());
        }
    }
}

impl ApplicationHandle for FakeHandle {
    fn subscribe_query_string(&self, handler: MessageHandler) -> bool {
        if self.with_ports {
            *self.query_port.borrow_mut() = Some(handler);
        }
        self.with_ports
    }

    fn subscribe_analytics(&self, handler: MessageHandler) -> bool {
        if self.with_ports {
            *self.analytics_port.borrow_mut() = Some(handler);
        }
        self.with_ports
    }
}

impl Application for FakeApp {
    type Handle = FakeHandle;

    fn init(&self, mount_id: &str, flags: &InitFlags) -> Result<FakeHandle> {
        if !self.dom_ids.contains(&mount_id) {
            return Err(BridgeError::MountPointMissing(mount_id.to_string()));
        }
        Ok(FakeHandle {
            flags: flags.clone(),
            with_ports: self.with_ports,
            ..FakeHandle::default()
        })
    }
}

fn app() -> FakeApp {
    FakeApp {
        dom_ids: vec!["root"],
        with_ports: true,
    }
}

fn survey_config() -> BridgeConfig {
    BridgeConfig::default().with_env_survey_url(Some("https://survey.example/ping"))
}

#[test]
fn flags_from_the_page_reach_the_application() {
    let page = Rc::new(Page::at(
        "https://timer.example/?fg=%23ab12cd&bg=black&init=31&h=1",
    ));
    let started = start(
        &BridgeConfig::default(),
        &app(),
        Rc::clone(&page),
        Rc::new(Gtag::default()),
        Rc::new(Network::default()),
    )
    .unwrap();

    let flags = &started.handle.flags;
    assert_eq!(flags.fg.as_deref(), Some("#ab12cd"));
    assert_eq!(flags.bg.as_deref(), Some("black"));
    assert_eq!(flags.init, None);
    assert_eq!(flags.h.as_deref(), Some("1"));
    assert_eq!(*flags, started.flags);
}

#[test]
fn unbounded_config_keeps_large_offsets() {
    let page = Rc::new(Page::at("https://timer.example/?init=31"));
    let mut config = BridgeConfig::default();
    config.init_range = None;
    let started = start(
        &config,
        &app(),
        page,
        Rc::new(Gtag::default()),
        Rc::new(Network::default()),
    )
    .unwrap();
    assert_eq!(started.handle.flags.init, Some(31));
}

#[test]
fn missing_mount_point_is_fatal() {
    let page = Rc::new(Page::at("https://timer.example/"));
    let mut config = BridgeConfig::default();
    config.mount_id = "app".into();
    let err = start(
        &config,
        &app(),
        page,
        Rc::new(Gtag::default()),
        Rc::new(Network::default()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, BridgeError::MountPointMissing(id) if id == "app"));
}

#[test]
fn query_updates_replace_the_address_in_place() {
    let page = Rc::new(Page::at("https://timer.example/app/?init=1#x"));
    let started = start(
        &BridgeConfig::default(),
        &app(),
        Rc::clone(&page),
        Rc::new(Gtag::default()),
        Rc::new(Network::default()),
    )
    .unwrap();

    started.handle.emit_query("?fg=%23112233");
    assert_eq!(*page.href.borrow(), "https://timer.example/app/?fg=%23112233");
    assert_eq!(page.replaced.borrow().len(), 1);

    started.handle.emit_query("?fg=%23445566");
    assert_eq!(page.replaced.borrow().len(), 2);
    assert_eq!(*page.href.borrow(), "https://timer.example/app/?fg=%23445566");
}

#[test]
fn analytics_events_are_forwarded_with_fixed_fields() {
    let gtag = Rc::new(Gtag {
        loaded: true,
        ..Gtag::default()
    });
    let started = start(
        &BridgeConfig::default(),
        &app(),
        Rc::new(Page::at("https://timer.example/")),
        Rc::clone(&gtag),
        Rc::new(Network::default()),
    )
    .unwrap();

    started
        .handle
        .emit_event(r#"{"category":"timer","action":"start","label":"focus","value":25}"#);
    started.handle.emit_event("{broken");
    started
        .handle
        .emit_event(r##"{"category":"settings","action":"change","fg":"#ffffff"}"##);

    let calls = gtag.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "start");
    assert_eq!(
        Value::Object(calls[0].1.clone()),
        json!({"event_category": "timer", "event_label": "focus", "value": 25})
    );
    assert_eq!(calls[1].0, "change");
    assert_eq!(
        Value::Object(calls[1].1.clone()),
        json!({"event_category": "settings", "fg": "#ffffff"})
    );
}

#[test]
fn survey_ping_fires_only_for_sync_timer_start() {
    let net = Rc::new(Network::default());
    let started = start(
        &survey_config(),
        &app(),
        Rc::new(Page::at("https://timer.example/")),
        Rc::new(Gtag::default()),
        Rc::clone(&net),
    )
    .unwrap();

    started
        .handle
        .emit_event(r#"{"category":"timer","action":"start","host":"timer.example"}"#);
    assert!(net.sent.borrow().is_empty());

    started.handle.emit_event(
        r##"{"category":"timer","action":"sync_timer_start","host":"timer.example","fg":"#000000","init":-5,"p":null}"##,
    );
    let sent = net.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].as_str(),
        "https://survey.example/ping?host=timer.example&fg=%23000000&init=-5"
    );
}

#[test]
fn badly_typed_label_still_forwards_and_pings() {
    let gtag = Rc::new(Gtag {
        loaded: true,
        ..Gtag::default()
    });
    let net = Rc::new(Network::default());
    let started = start(
        &survey_config(),
        &app(),
        Rc::new(Page::at("https://timer.example/")),
        Rc::clone(&gtag),
        Rc::clone(&net),
    )
    .unwrap();

    started.handle.emit_event(
        r#"{"category":"timer","action":"sync_timer_start","label":true,"value":"25","host":"h"}"#,
    );

    let calls = gtag.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "sync_timer_start");
    assert_eq!(
        Value::Object(calls[0].1.clone()),
        json!({"event_category": "timer", "host": "h"})
    );

    let sent = net.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].as_str(), "https://survey.example/ping?host=h");
}

#[test]
fn invalid_survey_url_disables_the_ping_but_still_mounts() {
    let net = Rc::new(Network::default());
    let config = BridgeConfig::default().with_env_survey_url(Some("not a url"));
    let started = start(
        &config,
        &app(),
        Rc::new(Page::at("https://timer.example/")),
        Rc::new(Gtag::default()),
        Rc::clone(&net),
    )
    .unwrap();

    started
        .handle
        .emit_event(r#"{"category":"timer","action":"sync_timer_start"}"#);
    assert!(net.sent.borrow().is_empty());
}

#[test]
fn application_without_ports_still_mounts() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    let plain = FakeApp {
        dom_ids: vec!["root"],
        with_ports: false,
    };
    let started = start(
        &BridgeConfig::default(),
        &plain,
        Rc::new(Page::at("https://timer.example/")),
        Rc::new(Gtag::default()),
        Rc::new(Network::default()),
    )
    .unwrap();
    assert!(started.handle.query_port.borrow().is_none());
    assert!(started.handle.analytics_port.borrow().is_none());
}
