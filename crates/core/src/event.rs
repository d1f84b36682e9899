//! Analytics events emitted by the application.
//!
//! Wire shape: a JSON object `{category, action, label?, value?, ...extra}`.
//! Every key other than the four named ones is kept in `extra` and forwarded
//! verbatim.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::error::{BridgeError, Result};

pub const EVENT_CATEGORY_KEY: &str = "event_category";
pub const EVENT_LABEL_KEY: &str = "event_label";
pub const VALUE_KEY: &str = "value";

/// Key/value payload delivered to an analytics sink.
pub type AnalyticsPayload = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
    pub value: Option<Number>,
    pub extra: BTreeMap<String, Value>,
}

impl AnalyticsEvent {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
            value: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Number>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Decode a serialized event.
    pub fn decode(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| BridgeError::InvalidEvent(e.to_string()))?;
        let Value::Object(mut obj) = value else {
            return Err(BridgeError::InvalidEvent("expected a JSON object".into()));
        };

        let category = take_required_string(&mut obj, "category")?;
        let action = take_required_string(&mut obj, "action")?;
        // Wrongly typed optional fields degrade to absent; the event still goes out.
        let label = match obj.remove("label") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                tracing::debug!(label = %other, "non-string label ignored");
                None
            }
        };
        let value = match obj.remove(VALUE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n),
            Some(other) => {
                tracing::debug!(value = %other, "non-numeric value ignored");
                None
            }
        };

        Ok(Self {
            category,
            action,
            label,
            value,
            extra: obj.into_iter().collect(),
        })
    }

    /// Build the sink payload: fixed-name category/label, `value` when
    /// present, then every extra field. Extra keys override earlier ones.
    pub fn payload(&self) -> AnalyticsPayload {
        let mut out = Map::new();
        out.insert(
            EVENT_CATEGORY_KEY.to_string(),
            Value::String(self.category.clone()),
        );
        if let Some(label) = &self.label {
            out.insert(EVENT_LABEL_KEY.to_string(), Value::String(label.clone()));
        }
        if let Some(value) = &self.value {
            out.insert(VALUE_KEY.to_string(), Value::Number(value.clone()));
        }
        for (k, v) in &self.extra {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    #[cfg(test)]
    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

fn take_required_string(obj: &mut Map<String, Value>, key: &str) -> Result<String> {
    match obj.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(BridgeError::InvalidEvent(format!("{key} must be a string"))),
        None => Err(BridgeError::InvalidEvent(format!("missing {key}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_named_fields_and_keeps_the_rest() {
        let ev = AnalyticsEvent::decode(
            r##"{"category":"timer","action":"start","label":"focus","value":25,"fg":"#ffffff"}"##,
        )
        .unwrap();
        assert_eq!(ev.category, "timer");
        assert_eq!(ev.action, "start");
        assert_eq!(ev.label.as_deref(), Some("focus"));
        assert_eq!(ev.value, Some(Number::from(25)));
        assert_eq!(ev.extra_str("fg"), Some("#ffffff"));
        assert_eq!(ev.extra.len(), 1);
    }

    #[test]
    fn null_label_and_value_are_absent() {
        let ev = AnalyticsEvent::decode(
            r#"{"category":"c","action":"a","label":null,"value":null}"#,
        )
        .unwrap();
        assert_eq!(ev.label, None);
        assert_eq!(ev.value, None);
        assert!(ev.extra.is_empty());
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in [
            "not json",
            "[1,2]",
            r#"{"action":"a"}"#,
            r#"{"category":"c"}"#,
            r#"{"category":1,"action":"a"}"#,
        ] {
            assert!(
                matches!(AnalyticsEvent::decode(raw), Err(BridgeError::InvalidEvent(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn wrongly_typed_label_and_value_become_absent() {
        let ev = AnalyticsEvent::decode(r#"{"category":"timer","action":"start","value":"25"}"#)
            .unwrap();
        assert_eq!(ev.value, None);
        assert_eq!(
            Value::Object(ev.payload()),
            json!({"event_category": "timer"})
        );

        let ev = AnalyticsEvent::decode(
            r#"{"category":"timer","action":"start","label":7,"value":3,"host":"h"}"#,
        )
        .unwrap();
        assert_eq!(ev.label, None);
        assert_eq!(
            Value::Object(ev.payload()),
            json!({"event_category": "timer", "value": 3, "host": "h"})
        );
    }

    #[test]
    fn payload_uses_fixed_field_names() {
        let ev = AnalyticsEvent::new("timer", "start")
            .with_label("focus")
            .with_value(25);
        assert_eq!(
            Value::Object(ev.payload()),
            json!({"event_category": "timer", "event_label": "focus", "value": 25})
        );
    }

    #[test]
    fn payload_omits_absent_label_and_value_but_keeps_zero() {
        let ev = AnalyticsEvent::new("timer", "stop");
        assert_eq!(
            Value::Object(ev.payload()),
            json!({"event_category": "timer"})
        );

        let ev = AnalyticsEvent::new("timer", "stop").with_value(0);
        assert_eq!(ev.payload().get("value"), Some(&json!(0)));
    }

    #[test]
    fn extra_fields_override_fixed_ones() {
        let ev = AnalyticsEvent::new("timer", "start")
            .with_extra("event_category", "override")
            .with_extra("host", "timer.example");
        let payload = ev.payload();
        assert_eq!(payload.get("event_category"), Some(&json!("override")));
        assert_eq!(payload.get("host"), Some(&json!("timer.example")));
    }
}
