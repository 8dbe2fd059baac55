use thiserror::Error;

use crate::flows::states::{FlowAction, FlowContext, FlowEvent, FlowState, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// The single shopping pipeline: collect query, extract details, search the
/// catalog, select, checkout, persist, summarise, loop or end.
#[derive(Clone, Debug, Default)]
pub struct ShoppingFlow;

impl FlowDefinition for ShoppingFlow {
    fn initial_state(&self) -> FlowState {
        FlowState::AwaitingQuery
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_shopping(current, event, context)
    }
}

pub struct FlowEngine<F = ShoppingFlow> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let result = self.flow.transition(current, event, context);
        match &result {
            Ok(outcome) => {
                tracing::debug!(
                    from = ?outcome.from,
                    to = ?outcome.to,
                    event = ?outcome.event,
                    "session transition applied"
                );
            }
            Err(error) => {
                tracing::warn!(state = ?current, event = ?event, %error, "session transition rejected");
            }
        }
        result
    }
}

impl Default for FlowEngine<ShoppingFlow> {
    fn default() -> Self {
        Self::new(ShoppingFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("no matches available to present from {state:?}")]
    NoMatches { state: FlowState },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_shopping(
    current: &FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        CollectCheckoutDetails, ExtractDetails, OfferRefinement, PresentMatches, PresentSummary,
        SearchCatalog, WriteCartFiles,
    };
    use FlowEvent::{
        ContinueShopping, MatchesAvailable, OrderPersisted, ProductSelected, QueryCollected,
        QuitRequested, RefineRequested, SearchCompleted, SelectionRetryRequested, SummaryPresented,
    };
    use FlowState::{
        AwaitingQuery, CatalogSearched, Checkout, DetailsExtracted, Ended, Persisted, Refine,
        SelectionPending, SessionSummary,
    };

    let (to, actions) = match (current, event) {
        // Empty or invalid free text still advances; validity is data.
        (AwaitingQuery, QueryCollected) | (Refine, QueryCollected) => {
            (DetailsExtracted, vec![ExtractDetails, SearchCatalog])
        }
        (DetailsExtracted, SearchCompleted) => (CatalogSearched, vec![PresentMatches]),
        (CatalogSearched, MatchesAvailable) => {
            if context.match_count == 0 {
                return Err(FlowTransitionError::NoMatches { state: current.clone() });
            }
            (SelectionPending, Vec::new())
        }
        (CatalogSearched, RefineRequested) | (SelectionPending, RefineRequested) => {
            (Refine, vec![OfferRefinement])
        }
        (SelectionPending, ProductSelected) => (Checkout, vec![CollectCheckoutDetails]),
        (Checkout, SelectionRetryRequested) => (SelectionPending, Vec::new()),
        (Checkout, OrderPersisted) => (Persisted, vec![WriteCartFiles]),
        (Persisted, SummaryPresented) => (SessionSummary, vec![PresentSummary]),
        (SessionSummary, ContinueShopping) => (AwaitingQuery, Vec::new()),
        (CatalogSearched, QuitRequested)
        | (SelectionPending, QuitRequested)
        | (Checkout, QuitRequested)
        | (SessionSummary, QuitRequested) => (Ended, Vec::new()),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), actions })
}
