//! Menu text rendered to the handset

use super::state::{DialogueState, Grade, Language, Screen, Subject};
use crate::db::Resource;
use std::fmt::Write;

const INVALID: &str = "Invalid choice. Try again:";

fn numbered<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        let _ = writeln!(out, "{}. {item}", i + 1);
    }
    out
}

fn main_options() -> &'static str {
    "1. Browse Subjects\n2. Search Resources\n3. My Account\n0. Exit"
}

fn subject_options() -> String {
    format!("{}0. Back", numbered(Subject::ALL.iter().map(|s| s.name())))
}

fn grade_options() -> String {
    format!("{}0. Back", numbered(Grade::ALL.iter().map(|g| g.name())))
}

fn language_options() -> String {
    format!(
        "{}0. Back",
        numbered(Language::ALL.iter().map(|l| l.menu_label()))
    )
}

fn resource_option_lines() -> &'static str {
    "1. View Summary\n2. Get SMS Link\n3. Translate\n0. Back"
}

pub fn main_menu() -> Screen {
    Screen::con(format!("Welcome to African LMS:\n{}", main_options()))
}

pub fn invalid_main_menu() -> Screen {
    Screen::con(format!("{INVALID}\n{}", main_options()))
}

pub fn goodbye() -> Screen {
    Screen::end("Thank you for using African LMS")
}

pub fn subject_menu() -> Screen {
    Screen::con(format!("Select Subject:\n{}", subject_options()))
}

pub fn invalid_subject_menu() -> Screen {
    Screen::con(format!("{INVALID}\n{}", subject_options()))
}

pub fn grade_menu() -> Screen {
    Screen::con(format!("Select Grade Level:\n{}", grade_options()))
}

pub fn invalid_grade_menu() -> Screen {
    Screen::con(format!("{INVALID}\n{}", grade_options()))
}

/// Resource list shown after a grade is picked or on return from the options menu.
/// `empty_notice` is used when the listing came back empty.
pub fn resource_list(resources: &[Resource], empty_notice: &str) -> Screen {
    if resources.is_empty() {
        return Screen::con(format!("{empty_notice}\n0. Back"));
    }
    let lines = numbered(resources.iter().map(|r| r.title.as_str()));
    Screen::con(format!("Select Resource:\n{lines}0. Back"))
}

pub const NO_RESOURCES_FOR_CRITERIA: &str = "No resources found for this criteria.";
pub const NO_RESOURCES: &str = "No resources found.";

pub fn empty_resource_prompt() -> Screen {
    Screen::con("Select Resource:\n0. Back")
}

pub fn invalid_resource_choice() -> Screen {
    Screen::con(format!("{INVALID}\n0. Back"))
}

pub fn resource_options_for(title: &str) -> Screen {
    Screen::con(format!("{title}:\n{}", resource_option_lines()))
}

pub fn resource_options() -> Screen {
    Screen::con(format!("Resource Options:\n{}", resource_option_lines()))
}

pub fn invalid_resource_options() -> Screen {
    Screen::con(format!("{INVALID}\n{}", resource_option_lines()))
}

pub fn language_menu() -> Screen {
    Screen::con(format!("Select Language:\n{}", language_options()))
}

pub fn invalid_language_menu() -> Screen {
    Screen::con(format!("{INVALID}\n{}", language_options()))
}

pub fn search_prompt() -> Screen {
    Screen::con("Enter search term:")
}

pub fn search_results(resources: &[Resource]) -> Screen {
    let mut lines = String::new();
    for (i, r) in resources.iter().enumerate() {
        let _ = writeln!(lines, "{}. {} ({})", i + 1, r.title, r.subject);
    }
    Screen::con(format!("Search Results:\n{lines}0. Back"))
}

pub fn no_search_results() -> Screen {
    Screen::con(format!("{NO_RESOURCES}\n0. Back"))
}

pub fn search_results_placeholder() -> Screen {
    Screen::con("Search results functionality would be implemented here.\n0. Back")
}

pub fn account_menu() -> Screen {
    Screen::con("Account Options:\n1. Register\n2. Login\n0. Back")
}

pub fn account_placeholder() -> Screen {
    Screen::con("Account management would be implemented here.\n0. Back")
}

pub fn summary(text: &str) -> Screen {
    Screen::end(format!("Summary: {text}"))
}

pub fn translated_title(text: &str) -> Screen {
    Screen::end(format!("Translated title: {text}"))
}

pub fn translation_unavailable(original: &str) -> Screen {
    Screen::end(format!("Translation unavailable. Original title: {original}"))
}

pub fn sms_link_queued() -> Screen {
    Screen::end("SMS with resource link will be sent shortly.")
}

pub fn resource_not_found() -> Screen {
    Screen::end("Resource not found.")
}

/// Prompt shown for a state when no earlier screen is on record
pub fn default_prompt(state: &DialogueState) -> Screen {
    match state {
        DialogueState::Main => main_menu(),
        DialogueState::BrowseSubjects => subject_menu(),
        DialogueState::SelectGrade { .. } => grade_menu(),
        DialogueState::BrowseResources { .. } => empty_resource_prompt(),
        DialogueState::ResourceOptions { .. } => resource_options(),
        DialogueState::SelectTranslationLanguage { .. } => language_menu(),
        DialogueState::Search => search_prompt(),
        DialogueState::SearchResults => search_results_placeholder(),
        DialogueState::Account => account_menu(),
    }
}
