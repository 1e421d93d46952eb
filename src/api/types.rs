//! API request and response types

use crate::db::ResourceFilter;
use serde::{Deserialize, Serialize};

/// Page size used when a listing request names none
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Largest page a listing request may ask for
pub const MAX_PAGE_SIZE: usize = 100;

/// Gateway callback, form-encoded
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdCallback {
    pub session_id: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub text: String,
    #[allow(dead_code)] // Sent by the gateway, not used for routing
    pub service_code: Option<String>,
    #[allow(dead_code)] // Sent by the gateway, not used for routing
    pub network_code: Option<String>,
}

/// JSON USSD turn
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdRequest {
    pub phone_number: String,
    pub session_id: String,
    #[serde(default)]
    pub text: String,
}

/// JSON USSD reply carrying the wire text
#[derive(Debug, Serialize, Deserialize)]
pub struct UssdResponse {
    pub message: String,
    pub status: String,
}

/// Query parameters for the resource listing
#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub subject: Option<String>,
    pub grade_level: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    /// Free-text search over title, description and tags
    pub q: Option<String>,
}

impl ResourceQuery {
    pub fn offset(&self) -> usize {
        self.skip.unwrap_or(0)
    }

    pub fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    pub fn filter(&self) -> ResourceFilter {
        fn present(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        ResourceFilter {
            subject: present(&self.subject),
            grade_level: present(&self.grade_level),
            country: present(&self.country),
            language: present(&self.language),
            text: present(&self.q),
        }
    }
}

/// Response for the root endpoint
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Response for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
