//! Pure state transition function
//!
//! Given the stored dialogue state and one event, computes the next state and
//! either a screen to send or an effect for the runtime to perform. No I/O.

use super::effect::{AfterList, AfterLoad, Effect};
use super::event::Event;
use super::menus;
use super::state::{menu_number, DialogueState, Grade, Language, Screen, Subject};
use crate::db::{Resource, ResourceFilter};
use thiserror::Error;

/// Maximum number of resources listed on one USSD screen
pub const LIST_LIMIT: usize = 5;

const BACK: &str = "0";

/// What the runtime should do after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Send this screen; the turn is complete
    Respond(Screen),
    /// Perform I/O and feed the outcome back as an event
    Run(Effect),
    /// Input carried no new token; resend the previous screen unchanged
    Repeat,
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DialogueState,
    pub step: Step,
}

impl TransitionResult {
    fn respond(state: DialogueState, screen: Screen) -> Self {
        Self {
            new_state: state,
            step: Step::Respond(screen),
        }
    }

    fn run(state: DialogueState, effect: Effect) -> Self {
        Self {
            new_state: state,
            step: Step::Run(effect),
        }
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Catalog filter for a subject/grade listing.
///
/// Shared by the listing shown after a grade pick and the re-query that
/// resolves the user's numeric choice, so both see the same ordering.
pub fn browse_filter(subject: Subject, grade: Grade) -> ResourceFilter {
    ResourceFilter {
        subject: Some(subject.name().to_string()),
        grade_level: Some(grade.name().to_string()),
        ..ResourceFilter::default()
    }
}

/// Pure transition function
pub fn transition(
    state: &DialogueState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Turn input
        // ============================================================
        (state, Event::Input { tokens, consumed }) => {
            if tokens.len() <= consumed {
                return Ok(TransitionResult {
                    new_state: state.clone(),
                    step: Step::Repeat,
                });
            }
            let choice = tokens.last().map_or("", String::as_str);
            Ok(on_choice(state, choice))
        }

        // ============================================================
        // Catalog results
        // ============================================================
        (
            DialogueState::BrowseResources { .. },
            Event::ResourcesListed {
                then: AfterList::GradeSelected,
                resources,
            },
        ) => Ok(TransitionResult::respond(
            state.clone(),
            menus::resource_list(&resources, menus::NO_RESOURCES_FOR_CRITERIA),
        )),

        (
            DialogueState::BrowseResources { .. },
            Event::ResourcesListed {
                then: AfterList::ReturnedFromOptions,
                resources,
            },
        ) => Ok(TransitionResult::respond(
            state.clone(),
            menus::resource_list(&resources, menus::NO_RESOURCES),
        )),

        (
            DialogueState::BrowseResources { subject, grade },
            Event::ResourcesListed {
                then: AfterList::Pick { index },
                resources,
            },
        ) => Ok(match resources.get(index) {
            Some(resource) => TransitionResult::respond(
                DialogueState::ResourceOptions {
                    subject: *subject,
                    grade: *grade,
                    resource_id: resource.id,
                },
                menus::resource_options_for(&resource.title),
            ),
            None => TransitionResult::respond(state.clone(), menus::invalid_resource_choice()),
        }),

        (
            DialogueState::Search,
            Event::ResourcesListed {
                then: AfterList::SearchResults,
                resources,
            },
        ) => Ok(if resources.is_empty() {
            TransitionResult::respond(DialogueState::Main, menus::no_search_results())
        } else {
            TransitionResult::respond(
                DialogueState::SearchResults,
                menus::search_results(&resources),
            )
        }),

        // ============================================================
        // Resource actions
        // ============================================================
        (
            DialogueState::ResourceOptions { .. } | DialogueState::SelectTranslationLanguage { .. },
            Event::ResourceLoaded { resource: None, .. },
        ) => Ok(TransitionResult::respond(
            state.clone(),
            menus::resource_not_found(),
        )),

        (
            DialogueState::ResourceOptions { .. },
            Event::ResourceLoaded {
                then: AfterLoad::Summarize,
                resource: Some(resource),
            },
        ) => Ok(TransitionResult::run(
            state.clone(),
            Effect::Summarize {
                resource_id: resource.id,
                text: summary_source(&resource),
            },
        )),

        (
            DialogueState::ResourceOptions { .. },
            Event::ResourceLoaded {
                then: AfterLoad::SmsLink,
                resource: Some(_),
            },
        ) => Ok(TransitionResult::respond(
            state.clone(),
            menus::sms_link_queued(),
        )),

        (
            DialogueState::SelectTranslationLanguage { .. },
            Event::ResourceLoaded {
                then: AfterLoad::Translate(language),
                resource: Some(resource),
            },
        ) => Ok(TransitionResult::run(
            state.clone(),
            Effect::Translate {
                resource_id: resource.id,
                text: resource.title,
                language,
            },
        )),

        // ============================================================
        // Adapter results (fail-soft)
        // ============================================================
        (DialogueState::ResourceOptions { .. }, Event::SummaryReady { source, result }) => {
            let text = result.unwrap_or(source);
            Ok(TransitionResult::respond(
                state.clone(),
                menus::summary(&text),
            ))
        }

        (
            DialogueState::SelectTranslationLanguage { .. },
            Event::TranslationReady { original, result },
        ) => {
            let screen = match result {
                Ok(text) => menus::translated_title(&text),
                Err(_) => menus::translation_unavailable(&original),
            };
            Ok(TransitionResult::respond(state.clone(), screen))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

/// Handle the newest token for the current state
fn on_choice(state: &DialogueState, choice: &str) -> TransitionResult {
    match state {
        DialogueState::Main => match choice {
            "1" => TransitionResult::respond(DialogueState::BrowseSubjects, menus::subject_menu()),
            "2" => TransitionResult::respond(DialogueState::Search, menus::search_prompt()),
            "3" => TransitionResult::respond(DialogueState::Account, menus::account_menu()),
            BACK => TransitionResult::respond(DialogueState::Main, menus::goodbye()),
            _ => TransitionResult::respond(DialogueState::Main, menus::invalid_main_menu()),
        },

        DialogueState::BrowseSubjects => {
            if choice == BACK {
                return TransitionResult::respond(DialogueState::Main, menus::main_menu());
            }
            match Subject::from_choice(choice) {
                Some(subject) => TransitionResult::respond(
                    DialogueState::SelectGrade { subject },
                    menus::grade_menu(),
                ),
                None => TransitionResult::respond(state.clone(), menus::invalid_subject_menu()),
            }
        }

        DialogueState::SelectGrade { subject } => {
            if choice == BACK {
                return TransitionResult::respond(
                    DialogueState::BrowseSubjects,
                    menus::subject_menu(),
                );
            }
            match Grade::from_choice(choice) {
                Some(grade) => TransitionResult::run(
                    DialogueState::BrowseResources {
                        subject: *subject,
                        grade,
                    },
                    Effect::list(
                        browse_filter(*subject, grade),
                        LIST_LIMIT,
                        AfterList::GradeSelected,
                    ),
                ),
                None => TransitionResult::respond(state.clone(), menus::invalid_grade_menu()),
            }
        }

        DialogueState::BrowseResources { subject, grade } => {
            if choice == BACK {
                return TransitionResult::respond(
                    DialogueState::SelectGrade { subject: *subject },
                    menus::grade_menu(),
                );
            }
            // Numeric but out of range is resolved once the listing is known
            match menu_number(choice) {
                Some(n) if n >= 1 => TransitionResult::run(
                    state.clone(),
                    Effect::list(
                        browse_filter(*subject, *grade),
                        LIST_LIMIT,
                        AfterList::Pick { index: n - 1 },
                    ),
                ),
                _ => TransitionResult::respond(state.clone(), menus::invalid_resource_choice()),
            }
        }

        DialogueState::ResourceOptions {
            subject,
            grade,
            resource_id,
        } => match choice {
            BACK => TransitionResult::run(
                DialogueState::BrowseResources {
                    subject: *subject,
                    grade: *grade,
                },
                Effect::list(
                    browse_filter(*subject, *grade),
                    LIST_LIMIT,
                    AfterList::ReturnedFromOptions,
                ),
            ),
            "1" => TransitionResult::run(
                state.clone(),
                Effect::load(*resource_id, AfterLoad::Summarize),
            ),
            "2" => TransitionResult::run(
                state.clone(),
                Effect::load(*resource_id, AfterLoad::SmsLink),
            ),
            "3" => TransitionResult::respond(
                DialogueState::SelectTranslationLanguage {
                    subject: *subject,
                    grade: *grade,
                    resource_id: *resource_id,
                },
                menus::language_menu(),
            ),
            _ => TransitionResult::respond(state.clone(), menus::invalid_resource_options()),
        },

        DialogueState::SelectTranslationLanguage {
            subject,
            grade,
            resource_id,
        } => {
            if choice == BACK {
                return TransitionResult::respond(
                    DialogueState::ResourceOptions {
                        subject: *subject,
                        grade: *grade,
                        resource_id: *resource_id,
                    },
                    menus::resource_options(),
                );
            }
            match Language::from_choice(choice) {
                Some(language) => TransitionResult::run(
                    state.clone(),
                    Effect::load(*resource_id, AfterLoad::Translate(language)),
                ),
                None => TransitionResult::respond(state.clone(), menus::invalid_language_menu()),
            }
        }

        DialogueState::Search => {
            if choice.is_empty() {
                return TransitionResult::respond(state.clone(), menus::search_prompt());
            }
            TransitionResult::run(
                state.clone(),
                Effect::list(
                    ResourceFilter {
                        text: Some(choice.to_string()),
                        ..ResourceFilter::default()
                    },
                    LIST_LIMIT,
                    AfterList::SearchResults,
                ),
            )
        }

        DialogueState::SearchResults => match choice {
            BACK => TransitionResult::respond(DialogueState::Main, menus::main_menu()),
            _ => TransitionResult::respond(state.clone(), menus::search_results_placeholder()),
        },

        DialogueState::Account => match choice {
            BACK => TransitionResult::respond(DialogueState::Main, menus::main_menu()),
            _ => TransitionResult::respond(state.clone(), menus::account_placeholder()),
        },
    }
}

/// Description when present, otherwise the title
fn summary_source(resource: &Resource) -> String {
    match resource.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => resource.title.clone(),
    }
}
