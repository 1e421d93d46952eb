//! Effects produced by state transitions

use super::state::Language;
use crate::db::ResourceFilter;

/// What to render once a resource listing comes back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterList {
    /// A grade was just picked
    GradeSelected,
    /// Back from the options menu, re-show the list
    ReturnedFromOptions,
    /// Resolve the user's 1-based pick against the listing
    Pick { index: usize },
    /// Free-text search results
    SearchResults,
}

/// What to do with a resource once it is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterLoad {
    Summarize,
    SmsLink,
    Translate(Language),
}

/// I/O the runtime performs on behalf of the pure transition function
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Query the approved catalog
    ListResources {
        filter: ResourceFilter,
        limit: usize,
        then: AfterList,
    },

    /// Fetch one approved resource by id
    LoadResource { resource_id: i64, then: AfterLoad },

    /// Call the summarization adapter
    Summarize { resource_id: i64, text: String },

    /// Call the translation adapter
    Translate {
        resource_id: i64,
        text: String,
        language: Language,
    },
}

impl Effect {
    pub fn list(filter: ResourceFilter, limit: usize, then: AfterList) -> Self {
        Effect::ListResources {
            filter,
            limit,
            then,
        }
    }

    pub fn load(resource_id: i64, then: AfterLoad) -> Self {
        Effect::LoadResource { resource_id, then }
    }

    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::ListResources { .. } => "list_resources",
            Effect::LoadResource { .. } => "load_resource",
            Effect::Summarize { .. } => "summarize",
            Effect::Translate { .. } => "translate",
        }
    }
}
