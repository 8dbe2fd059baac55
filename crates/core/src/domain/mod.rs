pub mod order;
pub mod product;
pub mod query;

use crate::domain::product::ProductMatch;

/// What the shopper decided when shown a numbered list of matches.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionOutcome {
    Select(ProductMatch),
    Refine(String),
    Quit,
}
