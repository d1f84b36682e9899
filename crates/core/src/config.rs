//! Bridge configuration.
//!
//! Layered: built-in defaults, then the build-time environment, then the
//! options object the host page passes in. Every field is optional on the
//! wire.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::flags::InitRange;
use crate::survey::SurveyEndpoint;

pub const DEFAULT_MOUNT_ID: &str = "root";
pub const SURVEY_URL_ENV: &str = "TIMER_SURVEY_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceWorkerPolicy {
    #[default]
    Unregister,
    Leave,
    /// Register the given worker script.
    Register(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    pub survey_url: Option<String>,
    pub mount_id: String,
    /// `None` accepts any `i32`.
    pub init_range: Option<InitRange>,
    pub service_worker: ServiceWorkerPolicy,
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            survey_url: None,
            mount_id: DEFAULT_MOUNT_ID.to_string(),
            init_range: Some(InitRange::default()),
            service_worker: ServiceWorkerPolicy::default(),
            log_level: "debug".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Apply a build-time environment value for the survey URL. Empty values
    /// are ignored.
    pub fn with_env_survey_url(mut self, value: Option<&str>) -> Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.survey_url = Some(v.to_string());
        }
        self
    }

    /// Overlay a JSON options object. Keys present in `raw` replace the
    /// current values; absent keys keep them.
    pub fn merge_json(self, raw: &str) -> Result<Self> {
        let overlay: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| BridgeError::Config(e.to_string()))?;
        let overlay = match overlay {
            serde_json::Value::Object(m) => m,
            serde_json::Value::Null => return Ok(self),
            _ => return Err(BridgeError::Config("options must be an object".into())),
        };

        let mut base = match serde_json::to_value(&self) {
            Ok(serde_json::Value::Object(m)) => m,
            _ => return Err(BridgeError::Config("config is not an object".into())),
        };
        base.extend(overlay);
        serde_json::from_value(serde_json::Value::Object(base))
            .map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.mount_id.trim().is_empty() {
            return Err(BridgeError::Config("mountId must not be empty".into()));
        }
        if let Some(r) = self.init_range {
            if r.min > r.max {
                return Err(BridgeError::Config(format!(
                    "initRange min {} exceeds max {}",
                    r.min, r.max
                )));
            }
        }
        self.survey_endpoint().map(|_| ())
    }

    pub fn survey_endpoint(&self) -> Result<Option<SurveyEndpoint>> {
        self.survey_url
            .as_deref()
            .map(SurveyEndpoint::parse)
            .transpose()
    }
}
