// ABOUTME: Centralized error handling for the application
// Provides consistent error types, conversions and the mapping to status codes

use crate::status::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoanDeskError {
    /// The API answered with a non-2xx status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("request rejected"))]
    Http { status: u16, message: Option<String> },

    /// No response was received (connection refused, timeout, DNS).
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built or sent for another reason.
    #[error("Request error: {0}")]
    Unknown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),
}

impl LoanDeskError {
    /// Outcome code to attach to an error report.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            LoanDeskError::Http { status, .. } => Some(StatusCode::Http(*status)),
            LoanDeskError::Network(_) => Some(StatusCode::NetworkError),
            LoanDeskError::Validation(_) => None,
            _ => Some(StatusCode::UnknownError),
        }
    }

    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            LoanDeskError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LoanDeskError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            LoanDeskError::Http {
                status: status.as_u16(),
                message: None,
            }
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            LoanDeskError::Network(err.to_string())
        } else if err.is_decode() {
            LoanDeskError::Unknown(format!("invalid response body: {}", err))
        } else {
            LoanDeskError::Unknown(err.to_string())
        }
    }
}

impl From<toml::de::Error> for LoanDeskError {
    fn from(err: toml::de::Error) -> Self {
        LoanDeskError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LoanDeskError {
    fn from(err: toml::ser::Error) -> Self {
        LoanDeskError::Config(err.to_string())
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for LoanDeskError {
    fn from(err: crossbeam_channel::SendError<T>) -> Self {
        LoanDeskError::ChannelSend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoanDeskError>;
