use serde::{Deserialize, Serialize};

/// One position in the linear shopping pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    AwaitingQuery,
    DetailsExtracted,
    CatalogSearched,
    SelectionPending,
    Refine,
    Checkout,
    Persisted,
    SessionSummary,
    Ended,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    QueryCollected,
    SearchCompleted,
    MatchesAvailable,
    RefineRequested,
    ProductSelected,
    SelectionRetryRequested,
    OrderPersisted,
    SummaryPresented,
    ContinueShopping,
    QuitRequested,
}

/// Guard data consulted during a transition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowContext {
    pub match_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    ExtractDetails,
    SearchCatalog,
    PresentMatches,
    OfferRefinement,
    CollectCheckoutDetails,
    WriteCartFiles,
    PresentSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
