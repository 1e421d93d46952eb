//! USSD dialogue state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime performs the effects and feeds their outcomes back in as events.

pub mod effect;
pub mod event;
pub mod menus;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{Language, Screen};
pub use transition::{transition, Step, TransitionError};

#[cfg(test)]
pub use state::{DialogueState, Grade, MenuLevel, Subject};
