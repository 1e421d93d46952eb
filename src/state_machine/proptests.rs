//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::effect::AfterList;
use super::state::*;
use super::transition::*;
use super::*;
use crate::db::Resource;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_subject() -> impl Strategy<Value = Subject> {
    prop::sample::select(Subject::ALL.to_vec())
}

fn arb_grade() -> impl Strategy<Value = Grade> {
    prop::sample::select(Grade::ALL.to_vec())
}

fn arb_state() -> impl Strategy<Value = DialogueState> {
    prop_oneof![
        Just(DialogueState::Main),
        Just(DialogueState::BrowseSubjects),
        arb_subject().prop_map(|subject| DialogueState::SelectGrade { subject }),
        (arb_subject(), arb_grade())
            .prop_map(|(subject, grade)| DialogueState::BrowseResources { subject, grade }),
        (arb_subject(), arb_grade(), 1i64..1000).prop_map(|(subject, grade, resource_id)| {
            DialogueState::ResourceOptions {
                subject,
                grade,
                resource_id,
            }
        }),
        (arb_subject(), arb_grade(), 1i64..1000).prop_map(|(subject, grade, resource_id)| {
            DialogueState::SelectTranslationLanguage {
                subject,
                grade,
                resource_id,
            }
        }),
        Just(DialogueState::Search),
        Just(DialogueState::SearchResults),
        Just(DialogueState::Account),
    ]
}

/// Tokens as a handset would send them, plus some junk
fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..10).prop_map(|n| n.to_string()),
        "[0-9]{2,4}",
        "[a-zA-Z ]{0,12}",
        Just(String::new()),
    ]
}

fn arb_tokens() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_token(), 0..8)
}

fn arb_listing() -> impl Strategy<Value = Vec<Resource>> {
    prop::collection::vec((1i64..500, "[A-Za-z ]{1,20}"), 0..=LIST_LIMIT).prop_map(|rows| {
        rows.into_iter()
            .map(|(id, title)| Resource::sample(id, &title))
            .collect()
    })
}

/// Levels reachable from `from` in a single input-driven transition
fn allowed_successors(from: MenuLevel) -> &'static [MenuLevel] {
    use MenuLevel::*;
    match from {
        Main => &[Main, BrowseSubjects, Search, Account],
        BrowseSubjects => &[BrowseSubjects, Main, SelectGrade],
        SelectGrade => &[SelectGrade, BrowseSubjects, BrowseResources],
        BrowseResources => &[BrowseResources, SelectGrade],
        ResourceOptions => &[ResourceOptions, BrowseResources, SelectTranslationLanguage],
        SelectTranslationLanguage => &[SelectTranslationLanguage, ResourceOptions],
        Search => &[Search],
        SearchResults => &[SearchResults, Main],
        Account => &[Account, Main],
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Any input in any state produces a transition, never an error
    #[test]
    fn prop_input_never_errors(state in arb_state(), tokens in arb_tokens(), consumed in 0usize..8) {
        let result = transition(&state, Event::Input { tokens, consumed });
        prop_assert!(result.is_ok());
    }

    /// Input-driven moves follow the transition table
    #[test]
    fn prop_input_walks_valid_edges(state in arb_state(), tokens in arb_tokens()) {
        prop_assume!(!tokens.is_empty());
        let consumed = tokens.len() - 1;
        let result = transition(&state, Event::Input { tokens, consumed }).unwrap();
        let from = state.menu_level();
        let to = result.new_state.menu_level();
        prop_assert!(
            allowed_successors(from).contains(&to),
            "{from} -> {to} is not an edge"
        );
    }

    /// A token count at or below the consumed depth re-renders without moving
    #[test]
    fn prop_stale_input_repeats(state in arb_state(), tokens in arb_tokens(), extra in 0usize..3) {
        let consumed = tokens.len() + extra;
        let result = transition(&state, Event::Input { tokens, consumed }).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.step, Step::Repeat);
    }

    /// Only the newest token matters once it is new
    #[test]
    fn prop_history_tokens_are_ignored(
        state in arb_state(),
        history_a in arb_tokens(),
        history_b in arb_tokens(),
        choice in arb_token(),
    ) {
        let mut a = history_a;
        let mut b = history_b;
        let consumed_a = a.len();
        let consumed_b = b.len();
        a.push(choice.clone());
        b.push(choice);
        let ra = transition(&state, Event::Input { tokens: a, consumed: consumed_a }).unwrap();
        let rb = transition(&state, Event::Input { tokens: b, consumed: consumed_b }).unwrap();
        prop_assert_eq!(ra.new_state, rb.new_state);
        prop_assert_eq!(ra.step, rb.step);
    }

    /// Back clears exactly the field owned by the state being left
    #[test]
    fn prop_back_clears_owned_field(state in arb_state()) {
        let result = transition(
            &state,
            Event::Input { tokens: vec!["0".to_string()], consumed: 0 },
        )
        .unwrap();
        let next = result.new_state;
        match state {
            DialogueState::SelectGrade { .. } => {
                prop_assert_eq!(next, DialogueState::BrowseSubjects);
            }
            DialogueState::BrowseResources { subject, .. } => {
                prop_assert_eq!(next, DialogueState::SelectGrade { subject });
            }
            DialogueState::ResourceOptions { subject, grade, .. } => {
                prop_assert_eq!(next, DialogueState::BrowseResources { subject, grade });
            }
            DialogueState::SelectTranslationLanguage { subject, grade, resource_id } => {
                prop_assert_eq!(
                    next,
                    DialogueState::ResourceOptions { subject, grade, resource_id }
                );
            }
            DialogueState::BrowseSubjects
            | DialogueState::SearchResults
            | DialogueState::Account => {
                prop_assert_eq!(next, DialogueState::Main);
            }
            // "0" is an exit on main and a search term on search
            DialogueState::Main | DialogueState::Search => {
                prop_assert_eq!(next.selected_subject(), None);
            }
        }
    }

    /// The same listing and pick always resolve to the same resource
    #[test]
    fn prop_pick_is_deterministic(
        subject in arb_subject(),
        grade in arb_grade(),
        listing in arb_listing(),
        index in 0usize..LIST_LIMIT,
    ) {
        let state = DialogueState::BrowseResources { subject, grade };
        let pick = |resources: Vec<Resource>| {
            transition(
                &state,
                Event::ResourcesListed { then: AfterList::Pick { index }, resources },
            )
            .unwrap()
        };
        let first = pick(listing.clone());
        let second = pick(listing.clone());
        prop_assert_eq!(&first.new_state, &second.new_state);
        prop_assert_eq!(&first.step, &second.step);

        match listing.get(index) {
            Some(resource) => {
                prop_assert_eq!(
                    first.new_state,
                    DialogueState::ResourceOptions { subject, grade, resource_id: resource.id }
                );
            }
            None => {
                prop_assert_eq!(first.new_state, state.clone());
            }
        }
    }

    /// Continue screens are never empty and carry the wire prefix
    #[test]
    fn prop_screens_render_with_prefix(state in arb_state(), tokens in arb_tokens()) {
        prop_assume!(!tokens.is_empty());
        let consumed = tokens.len() - 1;
        let result = transition(&state, Event::Input { tokens, consumed }).unwrap();
        if let Step::Respond(screen) = result.step {
            let wire = screen.to_string();
            prop_assert!(wire.starts_with("CON ") || wire.starts_with("END "));
            prop_assert!(!screen.body.is_empty());
            prop_assert_eq!(Screen::parse(&wire), Some(screen));
        }
    }
}
