//! Runtime for executing USSD turns
//!
//! Loads the session, drives the pure state machine, performs the effects it
//! asks for and persists the outcome.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::UssdRuntime;
pub use traits::*;

use crate::state_machine::TransitionError;
use std::sync::Arc;
use thiserror::Error;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime =
    UssdRuntime<DatabaseStorage, Arc<dyn Translator>, Arc<dyn Summarizer>>;

/// One inbound hop from the gateway
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub phone_number: String,
    pub session_id: String,
    /// Cumulative `*`-separated input for the whole session
    pub text: String,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Store error: {0}")]
    Store(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Turn did not settle after {0} steps")]
    Unsettled(usize),
}
