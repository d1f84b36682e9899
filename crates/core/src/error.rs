use thiserror::Error;

/// Failures surfaced by the bridge.
///
/// Only startup (mounting, configuration) returns these to a caller. The
/// message handlers log them and drop the offending input.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("mount point #{0} not found in document")]
    MountPointMissing(String),

    #[error("invalid analytics event: {0}")]
    InvalidEvent(String),

    #[error("invalid survey url {url:?}: {reason}")]
    InvalidSurveyUrl { url: String, reason: String },

    #[error("invalid page location {0:?}")]
    InvalidLocation(String),

    #[error("config: {0}")]
    Config(String),

    /// A failure reported by the host environment (DOM, history, fetch).
    #[error("{context}: {message}")]
    Host { context: String, message: String },
}

impl BridgeError {
    pub fn host(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Host {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
