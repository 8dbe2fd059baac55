//! Locating structured data inside free-text agent replies.
//!
//! Agent output carries no guarantee of valid JSON, so extraction is layered:
//! fenced ```json block, then the widest brace/bracket span, then a trailing-
//! comma repair pass. When all of that fails the domain heuristics in
//! [`recover_query`] and [`recover_catalog`] produce a best-effort structure
//! and never fail. Everything here is deterministic for a given input.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::product::{CatalogReply, ProductMatch, ACCEPTANCE_THRESHOLD};
use crate::domain::query::{PriceHint, ShoppingQuery};
use crate::errors::ExtractionFailure;

static FENCED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid fenced json regex")
});
static TRAILING_COMMA_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\}").expect("valid trailing comma regex"));
static TRAILING_COMMA_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("valid trailing comma regex"));

static QUERY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:looking for|want to buy|need|interested in)\s+(?:(?:a|an|the)\s+)?([a-zA-Z0-9 ]+?)\s+(?:for|with|that|in|at|of|by|quality|price|costs?)\b",
    )
    .expect("valid query name regex")
});
static DOLLAR_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d+(?:\.\d+)?)").expect("valid dollar amount regex"));
static QUERY_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:price|cost|for)[:\s]*(\d+(?:\.\d+)?)").expect("valid query price regex")
});

static PRODUCT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?si)Product\s*(?:ID|#)?:?\s*(\d+).*?Product Name:?\s*([^\n]+).*?Price:?\s*\$?(\d+(?:\.\d+)?)",
    )
    .expect("valid product block regex")
});
static QUALITY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Quality:?\s*([^\n]+)").expect("valid quality regex"));
static SCORE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Match Score:?\s*(\d+)").expect("valid score regex"));
static SUMMARY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Summary:?\s*([^\n]+)").expect("valid summary regex"));

/// Which JSON value the caller expects at the top level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            Self::Object => ('{', '}'),
            Self::Array => ('[', ']'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Locate and parse the JSON payload embedded in `raw`.
pub fn extract(raw: &str, shape: JsonShape) -> Result<Value, ExtractionFailure> {
    let candidate = fenced_block(raw).or_else(|| delimited_span(raw, shape));
    let Some(candidate) = candidate else {
        return Err(ExtractionFailure::NoStructure);
    };

    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(first_error) => {
            let repaired = repair_trailing_commas(candidate);
            serde_json::from_str::<Value>(&repaired)
                .map_err(|_| ExtractionFailure::Parse(first_error.to_string()))?
        }
    };

    if !shape.matches(&value) {
        return Err(ExtractionFailure::Shape(format!(
            "expected {shape:?}, found {}",
            type_name(&value)
        )));
    }
    Ok(value)
}

/// Extract and deserialize in one step.
pub fn extract_as<T: DeserializeOwned>(raw: &str, shape: JsonShape) -> Result<T, ExtractionFailure> {
    let value = extract(raw, shape)?;
    serde_json::from_value(value).map_err(|error| ExtractionFailure::Shape(error.to_string()))
}

fn fenced_block(raw: &str) -> Option<&str> {
    FENCED_JSON_RE.captures(raw).and_then(|captures| captures.get(1)).map(|m| m.as_str())
}

/// The widest span between the first opening and the last closing delimiter.
fn delimited_span(raw: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = shape.delimiters();
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

fn repair_trailing_commas(candidate: &str) -> String {
    let repaired = TRAILING_COMMA_OBJECT_RE.replace_all(candidate, "}");
    TRAILING_COMMA_ARRAY_RE.replace_all(&repaired, "]").into_owned()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Regex recovery of shopping intent straight from the user's request, used
/// when the orchestrator reply had no usable JSON. Falls back to the fixed
/// placeholder record when nothing at all can be recovered.
pub fn recover_query(user_input: &str) -> ShoppingQuery {
    let product_name = QUERY_NAME_RE
        .captures(user_input)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty());
    let price = DOLLAR_AMOUNT_RE
        .captures(user_input)
        .or_else(|| QUERY_PRICE_RE.captures(user_input))
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(PriceHint::Amount);

    if product_name.is_none() && price.is_none() {
        return ShoppingQuery {
            product_name: Some("unknown product".to_string()),
            price: Some(PriceHint::Text("market price".to_string())),
            product_id: None,
            quality: None,
            is_valid: false,
        };
    }

    let is_valid = product_name.is_some() && price.is_some();
    ShoppingQuery { product_name, price, product_id: None, quality: None, is_valid }
}

/// Regex recovery of catalog candidates from a reply with no usable JSON.
/// Quality and score lines are scanned once over the whole reply; a missing
/// score defaults to 50, which falls below the acceptance threshold.
pub fn recover_catalog(raw: &str) -> CatalogReply {
    let quality = QUALITY_LINE_RE
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "Standard".to_string());
    let match_score = SCORE_LINE_RE
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .unwrap_or(50);

    let mut products = Vec::new();
    if match_score >= ACCEPTANCE_THRESHOLD {
        for captures in PRODUCT_BLOCK_RE.captures_iter(raw) {
            let (Some(id), Some(name), Some(price)) =
                (captures.get(1), captures.get(2), captures.get(3))
            else {
                continue;
            };
            let Ok(price) = price.as_str().parse::<f64>() else {
                continue;
            };
            products.push(ProductMatch {
                product_id: id.as_str().trim().to_string(),
                product_name: name.as_str().trim().to_string(),
                price,
                quality: quality.clone(),
                in_stock: true,
                description: "High quality product".to_string(),
                match_score,
                reasoning: "Product matches search criteria".to_string(),
            });
        }
    }

    let search_summary = SUMMARY_LINE_RE
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| format!("Found {} matching products", products.len()));

    CatalogReply { products, search_summary, suggestions: Vec::new() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract, extract_as, recover_catalog, recover_query, JsonShape};
    use crate::domain::query::{PriceHint, ShoppingQuery};
    use crate::errors::ExtractionFailure;

    #[test]
    fn fenced_block_wins_over_surrounding_prose() {
        let raw = concat!(
            "Here is what I found {not json}:\n",
            "```json\n{\"product_name\": \"red jacket\", \"price\": 50, \"is_valid\": true}\n```\n",
            "Let me know if that helps."
        );
        let value = extract(raw, JsonShape::Object).expect("fenced block parses");
        assert_eq!(
            value,
            json!({"product_name": "red jacket", "price": 50, "is_valid": true})
        );
    }

    #[test]
    fn bare_object_span_is_found_without_fences() {
        let raw = "Sure! {\"is_valid\": false} hope that helps";
        let value = extract(raw, JsonShape::Object).expect("span parses");
        assert_eq!(value, json!({"is_valid": false}));
    }

    #[test]
    fn array_shape_uses_bracket_delimiters() {
        let raw = "Suggestions: [\"blue jacket\", \"rain coat\"] as requested";
        let value = extract(raw, JsonShape::Array).expect("array parses");
        assert_eq!(value, json!(["blue jacket", "rain coat"]));
    }

    #[test]
    fn trailing_commas_are_repaired_once() {
        let raw = r#"{"products": [{"product_id":"1","product_name":"lamp","price":12.0,},],"search_summary":"ok",}"#;
        let value = extract(raw, JsonShape::Object).expect("repaired parse");
        assert_eq!(value["products"][0]["product_name"], "lamp");
    }

    #[test]
    fn hopeless_input_reports_no_structure() {
        let error = extract("no structure here at all", JsonShape::Object)
            .expect_err("nothing to parse");
        assert_eq!(error, ExtractionFailure::NoStructure);
    }

    #[test]
    fn wrong_top_level_shape_is_rejected() {
        let error = extract("```json\n[1, 2, 3]\n```", JsonShape::Object)
            .expect_err("array is not an object");
        assert!(matches!(error, ExtractionFailure::Shape(_)));
    }

    #[test]
    fn typed_extraction_builds_the_shopping_query() {
        let raw = "```json\n{\"product_name\":\"red jacket\",\"price\":50,\"is_valid\":true}\n```";
        let query: ShoppingQuery = extract_as(raw, JsonShape::Object).expect("typed extract");
        assert_eq!(query.product_name.as_deref(), Some("red jacket"));
        assert_eq!(query.price, Some(PriceHint::Amount(50.0)));
        assert!(query.is_valid);
    }

    #[test]
    fn query_recovery_finds_name_and_price() {
        let query = recover_query("I'm looking for a red jacket for around $50 please");
        assert_eq!(query.product_name.as_deref(), Some("red jacket"));
        assert_eq!(query.price, Some(PriceHint::Amount(50.0)));
        assert!(query.is_valid);
    }

    #[test]
    fn query_recovery_without_price_is_invalid() {
        let query = recover_query("I need a desk lamp with a dimmer");
        assert_eq!(query.product_name.as_deref(), Some("desk lamp"));
        assert!(query.price.is_none());
        assert!(!query.is_valid);
    }

    #[test]
    fn query_recovery_total_failure_yields_placeholder() {
        let query = recover_query("hello!");
        assert_eq!(query.product_name.as_deref(), Some("unknown product"));
        assert_eq!(query.price, Some(PriceHint::Text("market price".to_string())));
        assert!(!query.is_valid);
    }

    #[test]
    fn catalog_recovery_keeps_products_at_or_above_threshold() {
        let raw = concat!(
            "Product ID: 101\nProduct Name: Red Jacket\nPrice: $49.99\n",
            "Quality: Premium\nMatch Score: 85\nSummary: one strong candidate"
        );
        let reply = recover_catalog(raw);
        assert_eq!(reply.products.len(), 1);
        let product = &reply.products[0];
        assert_eq!(product.product_id, "101");
        assert_eq!(product.product_name, "Red Jacket");
        assert_eq!(product.price, 49.99);
        assert_eq!(product.quality, "Premium");
        assert_eq!(product.match_score, 85);
        assert!(product.in_stock);
        assert_eq!(reply.search_summary, "one strong candidate");
    }

    #[test]
    fn catalog_recovery_default_score_falls_below_threshold() {
        let raw = "Product ID: 7\nProduct Name: Mystery Lamp\nPrice: $20";
        let reply = recover_catalog(raw);
        assert!(reply.products.is_empty());
        assert_eq!(reply.search_summary, "Found 0 matching products");
    }

    #[test]
    fn catalog_recovery_drops_low_scored_blocks() {
        let raw = "Product ID: 7\nProduct Name: Mystery Lamp\nPrice: $20\nMatch Score: 40";
        let reply = recover_catalog(raw);
        assert!(reply.products.is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let raw = "Product ID: 3\nProduct Name: Kettle\nPrice: $30\nMatch Score: 72";
        assert_eq!(recover_catalog(raw), recover_catalog(raw));
        let parsed = extract("{\"a\": 1}", JsonShape::Object);
        assert_eq!(parsed, extract("{\"a\": 1}", JsonShape::Object));
    }
}
