pub mod cart;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod flows;

pub use cart::{persist, persist_at, CartFiles};
pub use domain::order::{Customer, Order, Payment};
pub use domain::product::{CatalogReply, ProductMatch, ACCEPTANCE_THRESHOLD, MAX_MATCHES};
pub use domain::query::{PriceHint, ShoppingQuery};
pub use domain::SelectionOutcome;
pub use errors::{ExtractionFailure, PersistenceError, SessionError};
pub use extract::{extract, extract_as, recover_catalog, recover_query, JsonShape};
pub use flows::{
    FlowAction, FlowContext, FlowDefinition, FlowEngine, FlowEvent, FlowState,
    FlowTransitionError, ShoppingFlow, TransitionOutcome,
};
