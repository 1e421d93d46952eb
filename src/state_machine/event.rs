//! Events that drive a dialogue turn

use super::effect::{AfterList, AfterLoad};
use crate::db::Resource;
use crate::services::ServiceError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Transport events
    /// Full cumulative input for this turn, split into tokens.
    /// `consumed` is how many tokens earlier turns already acted on.
    Input { tokens: Vec<String>, consumed: usize },

    // Catalog events
    ResourcesListed {
        then: AfterList,
        resources: Vec<Resource>,
    },
    ResourceLoaded {
        then: AfterLoad,
        resource: Option<Resource>,
    },

    // Adapter events
    SummaryReady {
        /// Text that was sent for summarization, rendered on failure
        source: String,
        result: Result<String, ServiceError>,
    },
    TranslationReady {
        original: String,
        result: Result<String, ServiceError>,
    },
}

impl Event {
    /// Build an input event from the raw cumulative text
    #[allow(dead_code)] // Used in tests
    pub fn input(text: &str, consumed: usize) -> Self {
        Event::Input {
            tokens: split_input(text),
            consumed,
        }
    }
}

/// Split cumulative USSD input on `*`. Empty text is zero tokens.
pub fn split_input(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split('*').map(|t| t.trim().to_string()).collect()
}
