//! Mock implementations for testing
//!
//! These mocks enable runtime testing without real adapters.

use super::traits::*;
use crate::db::{Resource, ResourceFilter, UssdSession};
use crate::services::ServiceError;
use crate::state_machine::Language;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Translator
// ============================================================================

/// Translator that tags text with the language code, or always fails
pub struct MockTranslator {
    fail: bool,
    /// Record of all requests made
    pub calls: Mutex<Vec<(String, Language)>>,
}

#[allow(dead_code)]
impl MockTranslator {
    /// Answers `"<code>:<text>"`
    pub fn echo() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push((text.to_string(), target));
        if self.fail {
            return Err(ServiceError::server_error("HTTP 503: unavailable"));
        }
        Ok(format!("{}:{text}", target.code()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Mock Summarizer
// ============================================================================

/// Summarizer returning a fixed answer, or always failing
pub struct MockSummarizer {
    answer: Option<String>,
    /// Texts sent for summarization
    pub inputs: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockSummarizer {
    pub fn returning(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.answer
            .clone()
            .ok_or_else(|| ServiceError::network("connection refused"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Summarizer that sleeps before answering (for timeout testing)
pub struct SlowSummarizer {
    delay: Duration,
}

impl SlowSummarizer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Summarizer for SlowSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        tokio::time::sleep(self.delay).await;
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

// ============================================================================
// Failing Store
// ============================================================================

/// Storage wrapper that fails session loads, saves or catalog listings on demand
pub struct FailingStore<S> {
    inner: S,
    fail_loads: bool,
    fail_saves: bool,
    fail_listings: bool,
}

#[allow(dead_code)]
impl<S> FailingStore<S> {
    fn wrap(inner: S) -> Self {
        Self {
            inner,
            fail_loads: false,
            fail_saves: false,
            fail_listings: false,
        }
    }

    pub fn failing_loads(inner: S) -> Self {
        Self {
            fail_loads: true,
            ..Self::wrap(inner)
        }
    }

    pub fn failing_saves(inner: S) -> Self {
        Self {
            fail_saves: true,
            ..Self::wrap(inner)
        }
    }

    pub fn failing_listings(inner: S) -> Self {
        Self {
            fail_listings: true,
            ..Self::wrap(inner)
        }
    }
}

#[async_trait]
impl<S: Storage> SessionStore for FailingStore<S> {
    async fn get_or_create(
        &self,
        session_id: &str,
        phone_number: &str,
    ) -> Result<UssdSession, String> {
        if self.fail_loads {
            return Err("Database error: disk I/O error".to_string());
        }
        self.inner.get_or_create(session_id, phone_number).await
    }

    async fn save(&self, session: &UssdSession) -> Result<(), String> {
        if self.fail_saves {
            return Err("Database error: database is locked".to_string());
        }
        self.inner.save(session).await
    }
}

#[async_trait]
impl<S: Storage> Catalog for FailingStore<S> {
    async fn list_approved(
        &self,
        filter: &ResourceFilter,
        limit: usize,
    ) -> Result<Vec<Resource>, String> {
        if self.fail_listings {
            return Err("Database error: no such table: resources".to_string());
        }
        self.inner.list_approved(filter, limit).await
    }

    async fn get_resource(&self, id: i64) -> Result<Option<Resource>, String> {
        self.inner.get_resource(id).await
    }
}

#[async_trait]
impl<S: Storage> ContentCache for FailingStore<S> {
    async fn cached_translation(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String> {
        self.inner.cached_translation(resource_id, language).await
    }

    async fn store_translation(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String> {
        self.inner.store_translation(resource_id, language, text).await
    }

    async fn cached_summary(
        &self,
        resource_id: i64,
        language: &str,
    ) -> Result<Option<String>, String> {
        self.inner.cached_summary(resource_id, language).await
    }

    async fn store_summary(
        &self,
        resource_id: i64,
        language: &str,
        text: &str,
    ) -> Result<(), String> {
        self.inner.store_summary(resource_id, language, text).await
    }
}
