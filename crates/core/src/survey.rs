//! Survey telemetry ping.
//!
//! When a survey endpoint is configured, the `sync_timer_start` event also
//! fires a single GET carrying the user's current settings.

use serde_json::Value;
use url::Url;

use crate::error::{BridgeError, Result};
use crate::event::AnalyticsEvent;

pub const SURVEY_TRIGGER_ACTION: &str = "sync_timer_start";

/// Extra fields copied into the ping, in query order.
pub const SURVEY_FIELDS: [&str; 7] = ["host", "fg", "bg", "ff", "init", "h", "p"];

/// A validated survey base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyEndpoint {
    base: Url,
}

impl SurveyEndpoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let base = Url::parse(raw).map_err(|e| BridgeError::InvalidSurveyUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BridgeError::InvalidSurveyUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme {}", base.scheme()),
            });
        }
        Ok(Self { base })
    }

    /// The ping URL for `event`, or `None` when the event does not trigger one.
    pub fn ping_url(&self, event: &AnalyticsEvent) -> Option<Url> {
        if event.action != SURVEY_TRIGGER_ACTION {
            return None;
        }

        let mut url = self.base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for key in SURVEY_FIELDS {
                if let Some(v) = event.extra.get(key).and_then(query_value) {
                    pairs.append_pair(key, &v);
                }
            }
        }
        // An empty serializer still leaves a bare `?` behind.
        if url.query() == Some("") {
            url.set_query(None);
        }
        Some(url)
    }
}

fn query_value(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> SurveyEndpoint {
        SurveyEndpoint::parse("https://survey.example/ping").unwrap()
    }

    fn start_event() -> AnalyticsEvent {
        AnalyticsEvent::new("timer", SURVEY_TRIGGER_ACTION)
            .with_extra("host", "timer.example")
            .with_extra("fg", "#ffffff")
            .with_extra("bg", "navy")
            .with_extra("ff", "din")
            .with_extra("init", 5)
            .with_extra("h", true)
            .with_extra("p", Value::Null)
            .with_extra("unrelated", "dropped")
    }

    #[test]
    fn ping_maps_settings_in_order() {
        let url = endpoint().ping_url(&start_event()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://survey.example/ping?host=timer.example&fg=%23ffffff&bg=navy&ff=din&init=5&h=true"
        );
    }

    #[test]
    fn only_the_trigger_action_pings() {
        let ev = AnalyticsEvent::new("timer", "sync_timer_stop").with_extra("host", "x");
        assert_eq!(endpoint().ping_url(&ev), None);

        let ev = AnalyticsEvent::new("timer", "SYNC_TIMER_START");
        assert_eq!(endpoint().ping_url(&ev), None);
    }

    #[test]
    fn existing_base_query_is_kept() {
        let ep = SurveyEndpoint::parse("https://survey.example/ping?form=a1").unwrap();
        let ev = AnalyticsEvent::new("timer", SURVEY_TRIGGER_ACTION).with_extra("init", -3);
        assert_eq!(
            ep.ping_url(&ev).unwrap().as_str(),
            "https://survey.example/ping?form=a1&init=-3"
        );
    }

    #[test]
    fn no_fields_leaves_bare_base() {
        let ev = AnalyticsEvent::new("timer", SURVEY_TRIGGER_ACTION);
        assert_eq!(
            endpoint().ping_url(&ev).unwrap().as_str(),
            "https://survey.example/ping"
        );
    }

    #[test]
    fn rejects_non_http_bases() {
        assert!(SurveyEndpoint::parse("not a url").is_err());
        assert!(SurveyEndpoint::parse("ftp://survey.example/").is_err());
    }
}
