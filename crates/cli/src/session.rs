//! Client-side interaction state.
//!
//! The pricing core is stateless. Whether the "suggest downgrades" action is
//! offered is tracked here and driven by the outcome of each prediction.

use lapprice_core::BudgetOutcome;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NoPrediction,
    WithinBudget,
    OverBudget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    PricePredicted(BudgetOutcome),
    SuggestionsRequested,
    SelectionCleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    ShowEstimate,
    PromptForBudget,
    ConfirmWithinBudget,
    WarnOverBudget,
    OfferSuggestions,
    ShowSuggestions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub from: SessionState,
    pub to: SessionState,
    pub event: SessionEvent,
    pub actions: Vec<SessionAction>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionTransitionError {
    #[error("downgrade suggestions are only offered after an over-budget prediction (state: {state:?})")]
    SuggestionsUnavailable { state: SessionState },
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn suggestions_available(&self) -> bool {
        self.state == SessionState::OverBudget
    }

    pub fn apply(&mut self, event: SessionEvent) -> Result<TransitionOutcome, SessionTransitionError> {
        let outcome = transition(self.state, event)?;
        self.state = outcome.to;
        Ok(outcome)
    }
}

fn transition(
    current: SessionState,
    event: SessionEvent,
) -> Result<TransitionOutcome, SessionTransitionError> {
    use SessionAction::{
        ConfirmWithinBudget, OfferSuggestions, PromptForBudget, ShowEstimate, ShowSuggestions,
        WarnOverBudget,
    };
    use SessionState::{NoPrediction, OverBudget, WithinBudget};

    let (to, actions) = match (current, event) {
        (_, SessionEvent::PricePredicted(BudgetOutcome::OverBudget)) => {
            (OverBudget, vec![ShowEstimate, WarnOverBudget, OfferSuggestions])
        }
        (_, SessionEvent::PricePredicted(BudgetOutcome::WithinBudget)) => {
            (WithinBudget, vec![ShowEstimate, ConfirmWithinBudget])
        }
        (_, SessionEvent::PricePredicted(BudgetOutcome::NoBudget)) => {
            (NoPrediction, vec![ShowEstimate, PromptForBudget])
        }
        (OverBudget, SessionEvent::SuggestionsRequested) => (OverBudget, vec![ShowSuggestions]),
        (state, SessionEvent::SuggestionsRequested) => {
            return Err(SessionTransitionError::SuggestionsUnavailable { state });
        }
        (_, SessionEvent::SelectionCleared) => (NoPrediction, Vec::new()),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}
