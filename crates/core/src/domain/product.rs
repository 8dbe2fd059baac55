use serde::{Deserialize, Serialize};

/// Minimum match score a candidate needs to be shown to the shopper.
pub const ACCEPTANCE_THRESHOLD: u8 = 60;

/// Upper bound on candidates presented per search, in source order.
pub const MAX_MATCHES: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub match_score: u8,
    #[serde(default)]
    pub reasoning: String,
}

fn default_quality() -> String {
    "Standard".to_string()
}

fn default_in_stock() -> bool {
    true
}

/// The catalog agent's reply for one search, before and after normalisation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogReply {
    #[serde(default)]
    pub products: Vec<ProductMatch>,
    #[serde(default)]
    pub search_summary: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl CatalogReply {
    pub fn empty(search_summary: impl Into<String>) -> Self {
        Self { products: Vec::new(), search_summary: search_summary.into(), suggestions: Vec::new() }
    }

    /// Enforce the acceptance threshold and result cap regardless of what the
    /// agent returned. Source order is preserved; no re-sort happens.
    pub fn normalized(mut self) -> Self {
        self.products.retain(|product| product.match_score >= ACCEPTANCE_THRESHOLD);
        self.products.truncate(MAX_MATCHES);
        self.search_summary = format!(
            "Found {} matching products with score >= {}",
            self.products.len(),
            ACCEPTANCE_THRESHOLD
        );
        self
    }
}
