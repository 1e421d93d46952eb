//! Content service error types

use thiserror::Error;

/// Adapter error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Timeout, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Auth, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::InvalidResponse, message)
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::timeout(e.to_string())
        } else if e.is_decode() {
            ServiceError::invalid_response(e.to_string())
        } else {
            ServiceError::network(e.to_string())
        }
    }
}

/// Error classification, used for logging only; adapters are never retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// No answer within the configured timeout
    Timeout,
    /// 5xx from the service
    ServerError,
    /// 401/403 from the service
    Auth,
    /// Body could not be decoded or was empty
    InvalidResponse,
}

impl ServiceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidResponse => "invalid_response",
        }
    }
}
