//! Content service adapters
//!
//! Translation and summarization are external collaborators. The dialogue
//! engine only sees the `Translator` and `Summarizer` traits; which
//! implementation backs them is decided here from configuration.

mod error;
mod http;
mod local;

pub use error::{ServiceError, ServiceErrorKind};
pub use http::{HttpSummarizer, HttpTranslator};
pub use local::{LocalSummarizer, LocalTranslator};

use crate::state_machine::state::Language;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default per-call timeout. USSD gateways drop a hop after roughly ten seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Translates short catalog text
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError>;

    /// Backend name for logs
    fn name(&self) -> &str;

    /// Output is a stand-in, not a real translation, and is never cached
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Summarizes catalog descriptions
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError>;

    fn name(&self) -> &str;

    fn is_placeholder(&self) -> bool {
        false
    }
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Arc<T> {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
        (**self).translate(text, target).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_placeholder(&self) -> bool {
        (**self).is_placeholder()
    }
}

#[async_trait]
impl<T: Summarizer + ?Sized> Summarizer for Arc<T> {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        (**self).summarize(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_placeholder(&self) -> bool {
        (**self).is_placeholder()
    }
}

/// Configuration for content services
#[derive(Debug, Clone, Default)]
pub struct ServicesConfig {
    pub translation_url: Option<String>,
    pub summarization_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl ServicesConfig {
    pub fn from_env() -> Self {
        Self {
            translation_url: non_empty_var("TRANSLATION_API_URL"),
            summarization_url: non_empty_var("SUMMARIZATION_API_URL"),
            api_key: non_empty_var("AI_SERVICES_API_KEY"),
            timeout: std::env::var("AI_SERVICES_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Per-call timeout for adapter requests
    pub fn adapter_timeout(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// The adapters handed to the dialogue runtime
#[derive(Clone)]
pub struct ContentServices {
    pub translator: Arc<dyn Translator>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl ContentServices {
    /// Build adapters from configuration, falling back to the local
    /// implementations for anything not configured or not constructible.
    pub fn new(config: &ServicesConfig) -> Self {
        let translator: Arc<dyn Translator> = match &config.translation_url {
            Some(url) => match HttpTranslator::new(url.clone(), config.api_key.clone(), config.adapter_timeout()) {
                Ok(t) => Arc::new(t),
                Err(e) => {
                    tracing::warn!(error = %e, "Translation client unavailable, using local translator");
                    Arc::new(LocalTranslator)
                }
            },
            None => Arc::new(LocalTranslator),
        };

        let summarizer: Arc<dyn Summarizer> = match &config.summarization_url {
            Some(url) => match HttpSummarizer::new(url.clone(), config.api_key.clone(), config.adapter_timeout()) {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    tracing::warn!(error = %e, "Summarization client unavailable, using local summarizer");
                    Arc::new(LocalSummarizer)
                }
            },
            None => Arc::new(LocalSummarizer),
        };

        Self {
            translator: Arc::new(LoggingTranslator::new(translator)),
            summarizer: Arc::new(LoggingSummarizer::new(summarizer)),
        }
    }

    /// Local adapters only
    #[allow(dead_code)] // Used in tests
    pub fn local() -> Self {
        Self::new(&ServicesConfig::default())
    }
}

/// Logging wrapper for translators
pub struct LoggingTranslator {
    inner: Arc<dyn Translator>,
}

impl LoggingTranslator {
    pub fn new(inner: Arc<dyn Translator>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Translator for LoggingTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
        let start = Instant::now();
        let result = self.inner.translate(text, target).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    backend = %self.inner.name(),
                    language = %target,
                    duration_ms = %duration.as_millis(),
                    "Translation completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    backend = %self.inner.name(),
                    language = %target,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Translation failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_placeholder(&self) -> bool {
        self.inner.is_placeholder()
    }
}

/// Logging wrapper for summarizers
pub struct LoggingSummarizer {
    inner: Arc<dyn Summarizer>,
}

impl LoggingSummarizer {
    pub fn new(inner: Arc<dyn Summarizer>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Summarizer for LoggingSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        let start = Instant::now();
        let result = self.inner.summarize(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(summary) => {
                tracing::info!(
                    backend = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    input_chars = text.chars().count(),
                    output_chars = summary.chars().count(),
                    "Summary completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    backend = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Summary failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_placeholder(&self) -> bool {
        self.inner.is_placeholder()
    }
}
