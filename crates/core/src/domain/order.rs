use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::ProductMatch;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Payment details are treated as opaque strings and are never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payment {
    pub card_type: String,
    pub card_number: String,
}

/// A confirmed purchase. Created exactly once per completed checkout and
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub product: ProductMatch,
    pub customer: Customer,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
    #[serde(default = "default_shipping_status")]
    pub shipping_status: String,
    #[serde(default)]
    pub estimated_delivery: String,
}

fn default_payment_status() -> String {
    "completed".to_string()
}

fn default_shipping_status() -> String {
    "processing".to_string()
}

impl Order {
    /// Local construction used when the cart agent's reply cannot be parsed.
    /// Ids come from a v4 UUID, so identical replies never share an id.
    pub fn fallback(product: ProductMatch, customer: Customer, today: NaiveDate) -> Self {
        Self {
            order_id: format!("ORD-{}", Uuid::new_v4().simple()),
            product,
            customer,
            payment_status: default_payment_status(),
            shipping_status: default_shipping_status(),
            estimated_delivery: (today + Duration::days(7)).format("%Y-%m-%d").to_string(),
        }
    }
}
