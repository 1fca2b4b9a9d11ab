use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmartSkipError {
    #[error("Segment lookup failed for {video}: {source}")]
    FetchFailed {
        video: String,
        #[source]
        source: FetchError,
    },

    #[error("Config write failed for {path}: {reason}")]
    ConfigWriteFailed { path: PathBuf, reason: String },

    #[error("Session is no longer running")]
    SessionClosed,

    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

/// Why a segment lookup produced no list. Collapsed to an empty list at the
/// public fetch boundary.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of segment records, got {0}")]
    UnexpectedShape(&'static str),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SmartSkipError>;
