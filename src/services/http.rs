//! Remote translation and summarization over JSON/HTTP

use super::{ServiceError, Summarizer, Translator};
use crate::state_machine::state::Language;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Source language of catalog content
const SOURCE_LANGUAGE: &str = "en";

fn build_client(timeout: Duration) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {e}")))
}

fn authorize(request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

/// Classify a non-success response
fn status_error(status: StatusCode, body: &str) -> ServiceError {
    let message = format!("HTTP {status}: {body}");
    match status.as_u16() {
        401 | 403 => ServiceError::auth(message),
        500..=599 => ServiceError::server_error(message),
        _ => ServiceError::invalid_response(message),
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_language: &'a str,
    target_language: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// Translation service client
pub struct HttpTranslator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
        let body = TranslateRequest {
            text,
            source_language: SOURCE_LANGUAGE,
            target_language: target.code(),
        };
        let response = authorize(self.client.post(&self.url), self.api_key.as_deref())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: TranslateResponse = response.json().await?;
        if parsed.translated_text.trim().is_empty() {
            return Err(ServiceError::invalid_response("Empty translation"));
        }
        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Summarization service client
pub struct HttpSummarizer {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSummarizer {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        let body = SummarizeRequest {
            text,
            language: SOURCE_LANGUAGE,
        };
        let response = authorize(self.client.post(&self.url), self.api_key.as_deref())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: SummarizeResponse = response.json().await?;
        if parsed.summary.trim().is_empty() {
            return Err(ServiceError::invalid_response("Empty summary"));
        }
        Ok(parsed.summary)
    }

    fn name(&self) -> &str {
        &self.url
    }
}
