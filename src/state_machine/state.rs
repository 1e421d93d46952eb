//! Dialogue state types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Menu vocabularies
// ============================================================================

/// Subjects offered on the browse menu, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Mathematics,
    Science,
    Languages,
    History,
    Geography,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Mathematics,
        Subject::Science,
        Subject::Languages,
        Subject::History,
        Subject::Geography,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Science => "Science",
            Subject::Languages => "Languages",
            Subject::History => "History",
            Subject::Geography => "Geography",
        }
    }

    /// Map a 1-based menu choice to a subject
    pub fn from_choice(choice: &str) -> Option<Self> {
        menu_index(choice, Self::ALL.len()).map(|i| Self::ALL[i])
    }

    /// Parse the persisted column value
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grade levels offered after a subject is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    Primary,
    Secondary,
    University,
}

impl Grade {
    pub const ALL: [Grade; 3] = [Grade::Primary, Grade::Secondary, Grade::University];

    pub fn name(self) -> &'static str {
        match self {
            Grade::Primary => "Primary",
            Grade::Secondary => "Secondary",
            Grade::University => "University",
        }
    }

    pub fn from_choice(choice: &str) -> Option<Self> {
        menu_index(choice, Self::ALL.len()).map(|i| Self::ALL[i])
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Translation targets offered on the language menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Sw,
    Ha,
    Yo,
    Zu,
    Am,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Sw,
        Language::Ha,
        Language::Yo,
        Language::Zu,
        Language::Am,
    ];

    /// ISO 639-1 code sent to the translation service
    pub fn code(self) -> &'static str {
        match self {
            Language::Sw => "sw",
            Language::Ha => "ha",
            Language::Yo => "yo",
            Language::Zu => "zu",
            Language::Am => "am",
        }
    }

    /// Label shown on the USSD menu
    pub fn menu_label(self) -> &'static str {
        match self {
            Language::Sw => "Swahili",
            Language::Ha => "Hausa",
            Language::Yo => "Yoruba",
            Language::Zu => "Zulu",
            Language::Am => "Amharic",
        }
    }

    /// Endonym used by the local translator
    pub fn native_name(self) -> &'static str {
        match self {
            Language::Sw => "Kiswahili",
            Language::Ha => "Hausa",
            Language::Yo => "Yoruba",
            Language::Zu => "Zulu",
            Language::Am => "Amharic",
        }
    }

    pub fn from_choice(choice: &str) -> Option<Self> {
        menu_index(choice, Self::ALL.len()).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parse a menu key as typed on a keypad: ASCII digits with no sign and
/// no leading zero. `"+1"` and `"01"` are not keys.
pub fn menu_number(choice: &str) -> Option<usize> {
    if choice.is_empty()
        || !choice.bytes().all(|b| b.is_ascii_digit())
        || (choice.len() > 1 && choice.starts_with('0'))
    {
        return None;
    }
    choice.parse().ok()
}

/// Parse a 1-based menu choice into a 0-based index below `len`.
/// `"0"`, non-numeric and out-of-range input all yield `None`.
pub fn menu_index(choice: &str, len: usize) -> Option<usize> {
    let n = menu_number(choice)?;
    (1..=len).contains(&n).then(|| n - 1)
}

// ============================================================================
// Dialogue State
// ============================================================================

/// Persisted tag for the current node of the dialogue graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuLevel {
    Main,
    BrowseSubjects,
    SelectGrade,
    BrowseResources,
    ResourceOptions,
    SelectTranslationLanguage,
    Search,
    SearchResults,
    Account,
}

impl MenuLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MenuLevel::Main => "main",
            MenuLevel::BrowseSubjects => "browse_subjects",
            MenuLevel::SelectGrade => "select_grade",
            MenuLevel::BrowseResources => "browse_resources",
            MenuLevel::ResourceOptions => "resource_options",
            MenuLevel::SelectTranslationLanguage => "select_translation_language",
            MenuLevel::Search => "search",
            MenuLevel::SearchResults => "search_results",
            MenuLevel::Account => "account",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "main" => MenuLevel::Main,
            "browse_subjects" => MenuLevel::BrowseSubjects,
            "select_grade" => MenuLevel::SelectGrade,
            "browse_resources" => MenuLevel::BrowseResources,
            "resource_options" => MenuLevel::ResourceOptions,
            "select_translation_language" => MenuLevel::SelectTranslationLanguage,
            "search" => MenuLevel::Search,
            "search_results" => MenuLevel::SearchResults,
            "account" => MenuLevel::Account,
            _ => return None,
        })
    }
}

impl fmt::Display for MenuLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialogue state with the ratchet fields carried by the variants that own them.
///
/// A field set while drilling down stays set until a back transition leaves
/// the variant that introduced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "menu_level", rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Main,
    BrowseSubjects,
    SelectGrade {
        subject: Subject,
    },
    BrowseResources {
        subject: Subject,
        grade: Grade,
    },
    ResourceOptions {
        subject: Subject,
        grade: Grade,
        resource_id: i64,
    },
    SelectTranslationLanguage {
        subject: Subject,
        grade: Grade,
        resource_id: i64,
    },
    Search,
    SearchResults,
    Account,
}

impl DialogueState {
    pub fn menu_level(&self) -> MenuLevel {
        match self {
            DialogueState::Main => MenuLevel::Main,
            DialogueState::BrowseSubjects => MenuLevel::BrowseSubjects,
            DialogueState::SelectGrade { .. } => MenuLevel::SelectGrade,
            DialogueState::BrowseResources { .. } => MenuLevel::BrowseResources,
            DialogueState::ResourceOptions { .. } => MenuLevel::ResourceOptions,
            DialogueState::SelectTranslationLanguage { .. } => {
                MenuLevel::SelectTranslationLanguage
            }
            DialogueState::Search => MenuLevel::Search,
            DialogueState::SearchResults => MenuLevel::SearchResults,
            DialogueState::Account => MenuLevel::Account,
        }
    }

    pub fn selected_subject(&self) -> Option<Subject> {
        match self {
            DialogueState::SelectGrade { subject }
            | DialogueState::BrowseResources { subject, .. }
            | DialogueState::ResourceOptions { subject, .. }
            | DialogueState::SelectTranslationLanguage { subject, .. } => Some(*subject),
            _ => None,
        }
    }

    pub fn selected_grade(&self) -> Option<Grade> {
        match self {
            DialogueState::BrowseResources { grade, .. }
            | DialogueState::ResourceOptions { grade, .. }
            | DialogueState::SelectTranslationLanguage { grade, .. } => Some(*grade),
            _ => None,
        }
    }

    pub fn selected_resource_id(&self) -> Option<i64> {
        match self {
            DialogueState::ResourceOptions { resource_id, .. }
            | DialogueState::SelectTranslationLanguage { resource_id, .. } => Some(*resource_id),
            _ => None,
        }
    }

    /// Rebuild a state from its flattened persisted columns.
    ///
    /// Returns `None` when the ratchet fields required by `level` are missing.
    pub fn from_parts(
        level: MenuLevel,
        subject: Option<Subject>,
        grade: Option<Grade>,
        resource_id: Option<i64>,
    ) -> Option<Self> {
        Some(match level {
            MenuLevel::Main => DialogueState::Main,
            MenuLevel::BrowseSubjects => DialogueState::BrowseSubjects,
            MenuLevel::SelectGrade => DialogueState::SelectGrade { subject: subject? },
            MenuLevel::BrowseResources => DialogueState::BrowseResources {
                subject: subject?,
                grade: grade?,
            },
            MenuLevel::ResourceOptions => DialogueState::ResourceOptions {
                subject: subject?,
                grade: grade?,
                resource_id: resource_id?,
            },
            MenuLevel::SelectTranslationLanguage => DialogueState::SelectTranslationLanguage {
                subject: subject?,
                grade: grade?,
                resource_id: resource_id?,
            },
            MenuLevel::Search => DialogueState::Search,
            MenuLevel::SearchResults => DialogueState::SearchResults,
            MenuLevel::Account => DialogueState::Account,
        })
    }
}

// ============================================================================
// Rendered screens
// ============================================================================

/// Whether the transport keeps the channel open after this screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Continue,
    Final,
}

impl ReplyKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ReplyKind::Continue => "CON",
            ReplyKind::Final => "END",
        }
    }
}

/// One rendered USSD screen. `Display` produces the wire text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub kind: ReplyKind,
    pub body: String,
}

impl Screen {
    pub fn con(body: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Continue,
            body: body.into(),
        }
    }

    pub fn end(body: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Final,
            body: body.into(),
        }
    }

    pub fn is_final(&self) -> bool {
        self.kind == ReplyKind::Final
    }

    /// Parse wire text produced by `Display`
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(body) = text.strip_prefix("CON ") {
            Some(Self::con(body))
        } else {
            text.strip_prefix("END ").map(Self::end)
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.prefix(), self.body)
    }
}
