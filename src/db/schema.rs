//! Database schema and types

pub use crate::state_machine::state::DialogueState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    file_path TEXT,
    file_type TEXT NOT NULL,
    subject TEXT NOT NULL,
    grade_level TEXT NOT NULL,
    country TEXT NOT NULL,
    language TEXT NOT NULL DEFAULT 'en',
    tags TEXT,
    uploaded_by INTEGER NOT NULL DEFAULT 0,
    upload_date TEXT NOT NULL,
    is_approved BOOLEAN NOT NULL DEFAULT 0,
    view_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_resources_browse
    ON resources(is_approved, subject, grade_level, id);

CREATE TABLE IF NOT EXISTS ussd_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    phone_number TEXT NOT NULL,
    menu_level TEXT NOT NULL DEFAULT 'main',
    selected_subject TEXT,
    selected_grade TEXT,
    selected_resource_id INTEGER,
    input_depth INTEGER NOT NULL DEFAULT 0,
    last_response TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    resource_id INTEGER NOT NULL,
    language TEXT NOT NULL,
    translated_title TEXT NOT NULL,
    translation_date TEXT NOT NULL,

    UNIQUE (resource_id, language),
    FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    resource_id INTEGER NOT NULL,
    language TEXT NOT NULL,
    summary_text TEXT NOT NULL,
    created_at TEXT NOT NULL,

    UNIQUE (resource_id, language),
    FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE
);
";

/// Kind of file backing a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Pdf,
    Video,
    Text,
    Slides,
    Link,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Video => "video",
            FileType::Text => "text",
            FileType::Slides => "slides",
            FileType::Link => "link",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_file_type(s: &str) -> FileType {
    match s {
        "video" => FileType::Video,
        "text" => FileType::Text,
        "slides" => FileType::Slides,
        "link" => FileType::Link,
        _ => FileType::Pdf,
    }
}

/// Learning resource record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub file_type: FileType,
    pub subject: String,
    pub grade_level: String,
    pub country: String,
    pub language: String,
    pub tags: Option<String>,
    pub uploaded_by: i64,
    pub upload_date: DateTime<Utc>,
    pub is_approved: bool,
    pub view_count: i64,
}

#[cfg(test)]
impl Resource {
    /// Approved Mathematics/Primary resource for tests
    pub fn sample(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: None,
            file_path: None,
            file_type: FileType::Pdf,
            subject: "Mathematics".to_string(),
            grade_level: "Primary".to_string(),
            country: "Kenya".to_string(),
            language: "en".to_string(),
            tags: None,
            uploaded_by: 1,
            upload_date: Utc::now(),
            is_approved: true,
            view_count: 0,
        }
    }
}

/// Fields for inserting a resource (seed files, tests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_type: FileType,
    pub subject: String,
    pub grade_level: String,
    pub country: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub uploaded_by: i64,
    /// Seed files hold curated content, so entries are approved unless marked otherwise
    #[serde(default = "default_approved")]
    pub is_approved: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_approved() -> bool {
    true
}

#[allow(dead_code)] // Used in tests
impl NewResource {
    pub fn new(
        title: impl Into<String>,
        subject: impl Into<String>,
        grade_level: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            file_path: None,
            file_type: FileType::Pdf,
            subject: subject.into(),
            grade_level: grade_level.into(),
            country: "Kenya".to_string(),
            language: default_language(),
            tags: None,
            uploaded_by: 0,
            is_approved: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn unapproved(mut self) -> Self {
        self.is_approved = false;
        self
    }
}

/// Catalog filter. Attribute filters are case-insensitive equality;
/// `text` is a case-insensitive substring match on title, description and tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceFilter {
    pub subject: Option<String>,
    pub grade_level: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub text: Option<String>,
}

/// USSD session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UssdSession {
    pub session_id: String,
    pub phone_number: String,
    pub state: DialogueState,
    /// Number of input tokens already acted on
    pub input_depth: usize,
    /// Wire text of the last continue screen sent
    pub last_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cached translation of a resource title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub id: i64,
    pub resource_id: i64,
    pub language: String,
    pub translated_title: String,
    pub translation_date: DateTime<Utc>,
}

/// Cached summary of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub resource_id: i64,
    pub language: String,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}
