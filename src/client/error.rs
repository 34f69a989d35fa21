//! Error types for the API client.
//!
//! Failures are classified by where they happened:
//!
//! - the server answered with an error status ([`Error::NotFound`],
//!   [`Error::Unauthorized`], [`Error::Api`])
//! - the request went out but nothing came back ([`Error::NoResponse`])
//! - the request could not be built ([`Error::Config`])
//!
//! [`Error::user_message`] gives the text to show in a UI banner.

use reqwest::StatusCode;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum Error {
    /// 404 from the server, with its message.
    #[error("not found: {0}")]
    NotFound(String),

    /// 401: the token is missing or wrong. Callers should ask the user to log in.
    #[error("login required")]
    Unauthorized,

    /// Any other error status.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The request was sent but no response arrived (connection refused,
    /// timeout, reset).
    #[error("no response from server: {0}")]
    NoResponse(#[source] reqwest::Error),

    /// The request could not be constructed, e.g. a malformed base URL.
    #[error("invalid request configuration: {0}")]
    Config(String),

    /// The server answered 2xx but the body was not what we expected.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Result alias for client calls.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Banner text for end users.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "The requested resource does not exist".to_string(),
            Self::Unauthorized => "Please log in to continue".to_string(),
            Self::Api { status, message, .. } if message.is_empty() => {
                format!("Request failed with status {}", status)
            }
            Self::Api { message, .. } => message.clone(),
            Self::NoResponse(_) => {
                "The server did not respond, please check your network connection".to_string()
            }
            Self::Config(_) => "Request configuration error".to_string(),
            Self::Decode(_) => "The server sent an unexpected response".to_string(),
        }
    }

    /// True when the caller should send the user to a login screen.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Classify an error status using the envelope in `body` when there is one.
    pub(crate) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let envelope = serde_json::from_slice::<ApiResponse<serde_json::Value>>(body).ok();
        let message = envelope
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

        match status {
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            _ => Self::Api {
                status: status.as_u16(),
                code: envelope.map(|e| e.code).unwrap_or_default(),
                message,
            },
        }
    }

    /// Classify a transport failure from reqwest.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Config(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::NoResponse(err)
        }
    }
}
