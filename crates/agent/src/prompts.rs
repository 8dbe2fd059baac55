//! The three role prompts plus the alternatives prompt. Each instructs the
//! model to answer in JSON; the extractor copes when it does not comply.

use martley_core::domain::order::{Customer, Payment};
use martley_core::domain::product::{ProductMatch, ACCEPTANCE_THRESHOLD, MAX_MATCHES};
use martley_core::domain::query::ShoppingQuery;

/// Orchestrator role: turn one free-text request into a `ShoppingQuery`.
pub fn extraction(user_input: &str) -> String {
    format!(
        r#"Extract shopping details from this query: "{user_input}"

Extract the following information:
1. Product name (required)
2. Price or price range (required)
3. Product ID (optional)
4. Quality (optional)

Format your response as JSON with these fields:
- product_name
- price (number or range like "10-20")
- product_id (if available)
- quality (if available)
- is_valid (true if required fields are present)"#
    )
}

/// Catalog role: score candidates against the extracted criteria.
pub fn catalog_search(query: &ShoppingQuery) -> String {
    let criteria = query.criteria();
    let criteria_text = if criteria.is_empty() {
        "No specific criteria".to_string()
    } else {
        criteria.join(", ")
    };

    format!(
        r#"Search the product catalog for items matching these criteria:
{criteria_text}

For each product, calculate a match score based on:
1. Product name similarity (50 points max)
2. Price match (40 points max)
3. Quality match (10 points max)

ONLY return products with a match score of {ACCEPTANCE_THRESHOLD} or higher.
If no products meet this threshold, return an empty products array.

Return a maximum of {MAX_MATCHES} matches with detailed reasoning for each match.
Format your response as JSON with a products array, each entry containing:
- product_id
- product_name
- price
- quality
- in_stock (default to true)
- description
- match_score
- reasoning

Also include a search_summary field with a brief analysis of the results."#
    )
}

/// Catalog role follow-up when a search came back empty.
pub fn suggestions(product_name: &str) -> String {
    format!(
        r#"The user searched for "{product_name}" but we found no matches.
Provide 3-5 alternative product suggestions that might be similar.
Format your response as a simple JSON array of product names."#
    )
}

/// Cart role: produce the order confirmation for a confirmed purchase.
pub fn cart_checkout(product: &ProductMatch, customer: &Customer, payment: &Payment) -> String {
    format!(
        r#"Process this purchase:
- Product: {product_name}
- Product ID: {product_id}
- Price: ${price}
- Quality: {quality}

Customer information:
- Name: {name}
- Address: {address}
- Phone: {phone}
- Payment: {card_type} card

Generate an order confirmation with:
1. A unique order ID
2. Purchase details
3. Shipping information
4. Estimated delivery date (5-7 business days from now)

Format response as JSON with:
- order_id
- product (object with all product details)
- customer (object with customer details)
- payment_status
- shipping_status
- estimated_delivery"#,
        product_name = product.product_name,
        product_id = product.product_id,
        price = product.price,
        quality = product.quality,
        name = customer.name,
        address = customer.address,
        phone = customer.phone,
        card_type = payment.card_type,
    )
}

#[cfg(test)]
mod tests {
    use martley_core::domain::order::{Customer, Payment};
    use martley_core::domain::product::ProductMatch;
    use martley_core::domain::query::{PriceHint, ShoppingQuery};

    use super::{cart_checkout, catalog_search, extraction, suggestions};

    #[test]
    fn extraction_prompt_embeds_the_raw_request() {
        let prompt = extraction("I want a red jacket around $50");
        assert!(prompt.contains("\"I want a red jacket around $50\""));
        assert!(prompt.contains("is_valid"));
    }

    #[test]
    fn catalog_prompt_carries_criteria_and_threshold() {
        let query = ShoppingQuery {
            product_name: Some("red jacket".to_string()),
            price: Some(PriceHint::Amount(50.0)),
            ..ShoppingQuery::default()
        };
        let prompt = catalog_search(&query);
        assert!(prompt.contains("Product: red jacket"));
        assert!(prompt.contains("match score of 60 or higher"));
        assert!(prompt.contains("maximum of 3 matches"));
    }

    #[test]
    fn empty_criteria_degrade_to_a_no_criteria_search() {
        let prompt = catalog_search(&ShoppingQuery::default());
        assert!(prompt.contains("No specific criteria"));
    }

    #[test]
    fn checkout_prompt_never_includes_the_card_number() {
        let product = ProductMatch {
            product_id: "101".to_string(),
            product_name: "Red Jacket".to_string(),
            price: 49.99,
            quality: "Premium".to_string(),
            in_stock: true,
            description: String::new(),
            match_score: 85,
            reasoning: String::new(),
        };
        let customer = Customer {
            name: "Ada".to_string(),
            address: "1 Loop Rd".to_string(),
            phone: "555-0100".to_string(),
        };
        let payment =
            Payment { card_type: "Visa".to_string(), card_number: "4111999988887777".to_string() };

        let prompt = cart_checkout(&product, &customer, &payment);
        assert!(prompt.contains("Visa card"));
        assert!(!prompt.contains("4111999988887777"));
    }

    #[test]
    fn suggestions_prompt_asks_for_a_json_array() {
        let prompt = suggestions("red jacket");
        assert!(prompt.contains("\"red jacket\""));
        assert!(prompt.contains("JSON array"));
    }
}
