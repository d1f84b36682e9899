use url::Url;

use crate::error::{BridgeError, Result};

/// The parts of `document.location` the bridge reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub origin: String,
    pub pathname: String,
    pub search: String,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href).map_err(|_| BridgeError::InvalidLocation(href.to_string()))?;
        Ok(Self {
            origin: url.origin().ascii_serialization(),
            pathname: url.path().to_string(),
            search: url.query().map(|q| format!("?{q}")).unwrap_or_default(),
        })
    }

    /// `origin + pathname + query`. The query is used verbatim; the
    /// application already emits it encoded and with its leading `?`.
    pub fn with_query(&self, query: &str) -> String {
        format!("{}{}{}", self.origin, self.pathname, query)
    }
}
