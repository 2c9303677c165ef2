//! State machine for the page a visitor sees after scanning a code.
//!
//! The flow starts in [`LandingState::Loading`] while the code is resolved and
//! ends in one of [`LandingState::Error`], [`LandingState::NoCampaign`] or
//! [`LandingState::ActionComplete`]. Nothing is retried automatically; after a
//! failed action the flow returns to `Ready` so the visitor can try again.

use std::fmt::Display;

use crate::qr::{LandingDataBody, QrAction};

#[derive(Clone, Debug, PartialEq)]
pub enum LandingState {
    Loading,
    Error {
        message: String,
    },
    NoCampaign,
    Ready {
        landing: LandingDataBody,
        inline_error: Option<String>,
    },
    ActionPending {
        landing: LandingDataBody,
        action: QrAction,
    },
    ActionComplete {
        message: String,
    },
}

impl LandingState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LandingState::Error { .. } | LandingState::NoCampaign | LandingState::ActionComplete { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            LandingState::Loading => "loading",
            LandingState::Error { .. } => "error",
            LandingState::NoCampaign => "no-campaign",
            LandingState::Ready { .. } => "ready",
            LandingState::ActionPending { .. } => "action-pending",
            LandingState::ActionComplete { .. } => "action-complete",
        }
    }
}

/// How resolving the code went, as seen by the page.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Found(LandingDataBody),
    NotFound,
    Failed(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: &'static str,
    pub event: &'static str,
}

impl Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "cannot handle {} while {}", self.event, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

#[derive(Clone, Debug)]
pub struct LandingFlow {
    state: LandingState,
}

impl Default for LandingFlow {
    fn default() -> LandingFlow {
        LandingFlow::new()
    }
}

impl LandingFlow {
    pub fn new() -> LandingFlow {
        LandingFlow {
            state: LandingState::Loading,
        }
    }

    pub fn state(&self) -> &LandingState {
        &self.state
    }

    pub fn resolved(&mut self, resolution: Resolution) -> Result<&LandingState, InvalidTransition> {
        if self.state != LandingState::Loading {
            return Err(self.invalid("resolution"));
        }

        self.state = match resolution {
            Resolution::Found(landing) => LandingState::Ready {
                landing,
                inline_error: None,
            },
            Resolution::NotFound => LandingState::NoCampaign,
            Resolution::Failed(message) => LandingState::Error { message },
        };

        Ok(&self.state)
    }

    pub fn begin_action(&mut self, action: QrAction) -> Result<&LandingState, InvalidTransition> {
        let landing = match &self.state {
            LandingState::Ready { landing, .. } => landing.clone(),
            _ => return Err(self.invalid("action")),
        };

        self.state = LandingState::ActionPending { landing, action };

        Ok(&self.state)
    }

    /// `outcome` is the success message or the error to show inline.
    pub fn action_finished(
        &mut self,
        outcome: Result<String, String>,
    ) -> Result<&LandingState, InvalidTransition> {
        let landing = match &self.state {
            LandingState::ActionPending { landing, .. } => landing.clone(),
            _ => return Err(self.invalid("action result")),
        };

        self.state = match outcome {
            Ok(message) => LandingState::ActionComplete { message },
            Err(error) => LandingState::Ready {
                landing,
                inline_error: Some(error),
            },
        };

        Ok(&self.state)
    }

    fn invalid(&self, event: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.state.name(),
            event,
        }
    }
}
