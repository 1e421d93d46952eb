//! In-process adapters used when no remote service is configured

use super::{ServiceError, Summarizer, Translator};
use crate::state_machine::state::Language;
use async_trait::async_trait;

/// Number of leading sentences kept by the local summarizer
const SUMMARY_SENTENCES: usize = 3;

/// Tags text with the target language instead of translating it
pub struct LocalTranslator;

#[async_trait]
impl Translator for LocalTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
        Ok(format!("[{}] {text}", target.native_name()))
    }

    fn name(&self) -> &str {
        "local"
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

/// Keeps the first few sentences of the text
pub struct LocalSummarizer;

#[async_trait]
impl Summarizer for LocalSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        Ok(leading_sentences(text, SUMMARY_SENTENCES))
    }

    fn name(&self) -> &str {
        "local"
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

fn leading_sentences(text: &str, count: usize) -> String {
    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() <= count {
        return text.to_string();
    }
    let mut summary = sentences[..count].join(". ");
    if !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}
