//! Errors raised while talking to the weather provider.

use reqwest::StatusCode;
use thiserror::Error;

/// The only text a rendering surface ever shows for a failed fetch.
pub const FAILURE_MESSAGE: &str = "Failed to fetch weather data. Please check the location name.";

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, DNS or timeout failure before a status was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status, e.g. 404 for an unknown city or 401 for a bad key.
    #[error("provider returned {status}: {body}")]
    Provider { status: StatusCode, body: String },

    /// Body arrived but lacked required fields or was not valid.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// User-facing text. Detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        FAILURE_MESSAGE
    }

    pub(crate) fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("location must not be empty")]
pub struct InvalidLocation;
