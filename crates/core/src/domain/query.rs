use std::fmt;

use serde::{Deserialize, Serialize};

/// A price mention as the orchestrator reports it: either a plain number or
/// free text such as a range (`"10-20"`) or the degraded `"market price"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceHint {
    Amount(f64),
    Text(String),
}

impl fmt::Display for PriceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Shopping intent extracted from one free-text request. Immutable once
/// produced; invalid input still yields a record with `is_valid: false`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingQuery {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceHint>,
    #[serde(default, alias = "pd_id")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub is_valid: bool,
}

impl ShoppingQuery {
    /// Human-readable criteria lines used both for terminal echo and for the
    /// catalog prompt. Placeholder values from the degraded path are elided.
    pub fn criteria(&self) -> Vec<String> {
        let mut criteria = Vec::new();
        if let Some(name) = &self.product_name {
            if name != "unknown product" {
                criteria.push(format!("Product: {name}"));
            }
        }
        match &self.price {
            Some(PriceHint::Amount(amount)) => criteria.push(format!("Price: around ${amount}")),
            Some(PriceHint::Text(text)) if text.contains('-') => {
                criteria.push(format!("Price range: ${text}"));
            }
            _ => {}
        }
        if let Some(product_id) = &self.product_id {
            criteria.push(format!("Product ID: {product_id}"));
        }
        if let Some(quality) = &self.quality {
            criteria.push(format!("Quality: {quality}"));
        }
        criteria
    }
}

#[cfg(test)]
mod tests {
    use super::{PriceHint, ShoppingQuery};

    #[test]
    fn price_accepts_number_or_range_text() {
        let amount: ShoppingQuery =
            serde_json::from_str(r#"{"product_name":"jacket","price":50,"is_valid":true}"#)
                .expect("numeric price");
        assert_eq!(amount.price, Some(PriceHint::Amount(50.0)));

        let range: ShoppingQuery =
            serde_json::from_str(r#"{"product_name":"jacket","price":"40-60","is_valid":true}"#)
                .expect("range price");
        assert_eq!(range.price, Some(PriceHint::Text("40-60".to_string())));
    }

    #[test]
    fn accepts_legacy_pd_id_alias() {
        let query: ShoppingQuery =
            serde_json::from_str(r#"{"pd_id":"P-77","is_valid":false}"#).expect("alias field");
        assert_eq!(query.product_id.as_deref(), Some("P-77"));
    }

    #[test]
    fn criteria_elides_degraded_placeholders() {
        let query = ShoppingQuery {
            product_name: Some("unknown product".to_string()),
            price: Some(PriceHint::Text("market price".to_string())),
            ..ShoppingQuery::default()
        };
        assert!(query.criteria().is_empty());
    }

    #[test]
    fn criteria_lists_every_known_field() {
        let query = ShoppingQuery {
            product_name: Some("red jacket".to_string()),
            price: Some(PriceHint::Text("40-60".to_string())),
            product_id: Some("P-12".to_string()),
            quality: Some("premium".to_string()),
            is_valid: true,
        };
        assert_eq!(
            query.criteria(),
            vec![
                "Product: red jacket".to_string(),
                "Price range: $40-60".to_string(),
                "Product ID: P-12".to_string(),
                "Quality: premium".to_string(),
            ]
        );
    }
}
