//! Interactive shopping session: the linear pipeline from free-text query to
//! persisted cart files, with refine and retry loop-backs.

use std::path::PathBuf;

use chrono::Local;
use martley_core::cart;
use martley_core::domain::order::{Customer, Order, Payment};
use martley_core::domain::product::{CatalogReply, ProductMatch};
use martley_core::domain::query::ShoppingQuery;
use martley_core::domain::SelectionOutcome;
use martley_core::errors::SessionError;
use martley_core::extract::{extract_as, recover_catalog, recover_query, JsonShape};
use martley_core::flows::{FlowContext, FlowEngine, FlowEvent, FlowState};

use crate::llm::LlmClient;
use crate::prompts;
use crate::terminal::Terminal;

const BANNER: &str = "==================================================";

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    Done,
    UserQuit,
    NoMatches,
    RetriesExhausted,
    OutOfStock,
    PurchaseCancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub order_ids: Vec<String>,
    pub end_reason: EndReason,
}

pub struct SessionRunner<L, T> {
    llm: L,
    terminal: T,
    engine: FlowEngine,
    state: FlowState,
    cart_dir: PathBuf,
    max_selection_retries: u32,
}

impl<L, T> SessionRunner<L, T>
where
    L: LlmClient,
    T: Terminal,
{
    pub fn new(llm: L, terminal: T, cart_dir: PathBuf, max_selection_retries: u32) -> Self {
        let engine = FlowEngine::default();
        let state = engine.initial_state();
        Self { llm, terminal, engine, state, cart_dir, max_selection_retries }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    fn advance(&mut self, event: FlowEvent, context: &FlowContext) -> Result<(), SessionError> {
        let outcome = self.engine.apply(&self.state, &event, context)?;
        self.state = outcome.to;
        Ok(())
    }

    /// Run one full session: possibly several purchase loops, one report.
    pub async fn run(&mut self) -> Result<SessionReport, SessionError> {
        self.terminal.say("Welcome to our Agentic AI Shopping Mart!")?;
        let mut order_ids = Vec::new();
        let mut pending_query: Option<String> = None;

        let end_reason = loop {
            let user_input = match pending_query.take() {
                Some(refined) => refined,
                None => self.terminal.prompt("What would you like to shop for today? ")?,
            };
            self.advance(FlowEvent::QueryCollected, &FlowContext::default())?;

            self.terminal.say("Analyzing your shopping needs...")?;
            let query = self.extract_details(&user_input).await?;
            self.echo_criteria(&query)?;

            let catalog = self.search_catalog(&query).await?;
            self.advance(FlowEvent::SearchCompleted, &FlowContext::default())?;
            let context = FlowContext { match_count: catalog.products.len() };

            if catalog.products.is_empty() {
                self.terminal.say("No matching products found in catalog")?;
                self.terminal.say(&catalog.search_summary)?;
                self.offer_suggestions(&query).await?;

                let answer =
                    self.terminal.prompt("Would you like to refine your search? (y/n): ")?;
                if is_yes(&answer) {
                    self.advance(FlowEvent::RefineRequested, &context)?;
                    pending_query = Some(
                        self.terminal.prompt("Please provide more details for your search: ")?,
                    );
                    continue;
                }
                self.advance(FlowEvent::QuitRequested, &context)?;
                break EndReason::NoMatches;
            }

            self.terminal
                .say(&format!("Found {} matching products", catalog.products.len()))?;
            self.advance(FlowEvent::MatchesAvailable, &context)?;

            // Selection, checkout, persist. Loops back here when a purchase
            // attempt is abandoned but the shopper wants another pick.
            let selection_end = loop {
                match self.present_options(&catalog)? {
                    SelectionChoice::Exhausted => {
                        self.advance(FlowEvent::QuitRequested, &context)?;
                        break Some(EndReason::RetriesExhausted);
                    }
                    SelectionChoice::Outcome(SelectionOutcome::Quit) => {
                        self.advance(FlowEvent::QuitRequested, &context)?;
                        break Some(EndReason::UserQuit);
                    }
                    SelectionChoice::Outcome(SelectionOutcome::Refine(refined)) => {
                        self.advance(FlowEvent::RefineRequested, &context)?;
                        pending_query = Some(refined);
                        break None;
                    }
                    SelectionChoice::Outcome(SelectionOutcome::Select(product)) => {
                        if !product.in_stock {
                            if self.notify_when_available(&product)? {
                                continue;
                            }
                            self.advance(FlowEvent::QuitRequested, &context)?;
                            break Some(EndReason::OutOfStock);
                        }

                        self.advance(FlowEvent::ProductSelected, &context)?;
                        match self.checkout(product, &context).await? {
                            CheckoutOutcome::Completed(order_id) => {
                                order_ids.push(order_id);
                                let again = self.terminal.prompt(
                                    "Would you like to shop for something else? (y/n): ",
                                )?;
                                if is_yes(&again) {
                                    self.advance(FlowEvent::ContinueShopping, &context)?;
                                    self.terminal.say("Starting a new shopping session...")?;
                                    break None;
                                }
                                self.advance(FlowEvent::QuitRequested, &context)?;
                                break Some(EndReason::Done);
                            }
                            CheckoutOutcome::RetrySelection => continue,
                            CheckoutOutcome::Abandoned => {
                                break Some(EndReason::PurchaseCancelled);
                            }
                        }
                    }
                }
            };

            match selection_end {
                Some(reason) => break reason,
                None => continue,
            }
        };

        self.terminal.say("Thank you for using our shopping assistant. Have a great day!")?;
        tracing::info!(orders = order_ids.len(), end_reason = ?end_reason, "session finished");
        Ok(SessionReport { order_ids, end_reason })
    }

    async fn extract_details(
        &mut self,
        user_input: &str,
    ) -> Result<ShoppingQuery, SessionError> {
        self.terminal.say("Extracting details...")?;
        let query = match self.llm.execute(&prompts::extraction(user_input)).await {
            Ok(reply) => extract_as::<ShoppingQuery>(&reply, JsonShape::Object)
                .unwrap_or_else(|error| {
                    tracing::debug!(%error, "extraction reply had no usable json, recovering");
                    recover_query(user_input)
                }),
            Err(error) => {
                tracing::error!(%error, "orchestrator call failed, recovering from raw input");
                recover_query(user_input)
            }
        };
        Ok(query)
    }

    fn echo_criteria(&mut self, query: &ShoppingQuery) -> Result<(), SessionError> {
        let criteria = query.criteria();
        if criteria.is_empty() {
            self.terminal.say("Searching with no specific criteria")?;
        } else {
            self.terminal.say(&format!("Searching with criteria: {}", criteria.join(", ")))?;
        }
        Ok(())
    }

    async fn search_catalog(
        &mut self,
        query: &ShoppingQuery,
    ) -> Result<CatalogReply, SessionError> {
        self.terminal.say("Searching product catalog for matching items...")?;
        let catalog = match self.llm.execute(&prompts::catalog_search(query)).await {
            Ok(reply) => extract_as::<CatalogReply>(&reply, JsonShape::Object)
                .unwrap_or_else(|error| {
                    tracing::debug!(%error, "catalog reply had no usable json, recovering");
                    recover_catalog(&reply)
                })
                .normalized(),
            Err(error) => {
                tracing::error!(%error, "catalog search failed");
                CatalogReply::empty(format!("Search failed: {error}"))
            }
        };
        Ok(catalog)
    }

    async fn offer_suggestions(&mut self, query: &ShoppingQuery) -> Result<(), SessionError> {
        let Some(product_name) = query.product_name.as_deref() else {
            return Ok(());
        };
        if product_name == "unknown product" {
            return Ok(());
        }

        let suggestions = match self.llm.execute(&prompts::suggestions(product_name)).await {
            Ok(reply) => {
                extract_as::<Vec<String>>(&reply, JsonShape::Array).unwrap_or_default()
            }
            Err(error) => {
                tracing::warn!(%error, "suggestions call failed");
                Vec::new()
            }
        };
        if !suggestions.is_empty() {
            self.terminal
                .say(&format!("You might be interested in: {}", suggestions.join(", ")))?;
        }
        Ok(())
    }

    /// Numbered option list with refine/quit escapes. Invalid input re-prompts
    /// up to the configured bound; exhaustion behaves as quit.
    fn present_options(
        &mut self,
        catalog: &CatalogReply,
    ) -> Result<SelectionChoice, SessionError> {
        self.terminal.say("\n=== Product Options ===")?;
        for (index, product) in catalog.products.iter().enumerate() {
            self.terminal.say(&format!(
                "\n[{number}] {name}\n    Price: ${price}\n    Quality: {quality}\n    \
                 Description: {description}\n    In Stock: {in_stock}\n    Match Score: {score}\n    \
                 Why This Match: {reasoning}",
                number = index + 1,
                name = product.product_name,
                price = product.price,
                quality = product.quality,
                description = product.description,
                in_stock = if product.in_stock { "Yes" } else { "No" },
                score = product.match_score,
                reasoning = product.reasoning,
            ))?;
        }
        self.terminal.say("\n[R] Refine search")?;
        self.terminal.say("[Q] Quit search")?;

        let option_count = catalog.products.len();
        for _ in 0..self.max_selection_retries {
            let choice = self
                .terminal
                .prompt(&format!("\nSelect an option (1-{option_count}, R, Q): "))?
                .trim()
                .to_ascii_uppercase();

            match choice.as_str() {
                "Q" => return Ok(SelectionChoice::Outcome(SelectionOutcome::Quit)),
                "R" => {
                    self.terminal.say("Let's refine your search.")?;
                    let refined =
                        self.terminal.prompt("Please provide more specific details: ")?;
                    return Ok(SelectionChoice::Outcome(SelectionOutcome::Refine(refined)));
                }
                number => {
                    if let Ok(index) = number.parse::<usize>() {
                        if (1..=option_count).contains(&index) {
                            let product = catalog.products[index - 1].clone();
                            self.terminal
                                .say(&format!("\nYou selected: {}", product.product_name))?;
                            return Ok(SelectionChoice::Outcome(SelectionOutcome::Select(
                                product,
                            )));
                        }
                    }
                    self.terminal.say("Invalid selection. Please try again.")?;
                }
            }
        }

        tracing::warn!(
            retries = self.max_selection_retries,
            "selection retries exhausted, ending selection"
        );
        self.terminal.say("Too many invalid selections. Ending search.")?;
        Ok(SelectionChoice::Exhausted)
    }

    /// Out-of-stock detour. Returns true when the shopper wants to pick a
    /// different product.
    fn notify_when_available(&mut self, product: &ProductMatch) -> Result<bool, SessionError> {
        self.terminal.say(&format!(
            "We're sorry, but {} is currently out of stock.",
            product.product_name
        ))?;
        let notify = self
            .terminal
            .prompt("Would you like to be notified when it becomes available? (y/n): ")?;
        if is_yes(&notify) {
            let email = self.terminal.prompt("Please enter your email address: ")?;
            self.terminal.say(&format!(
                "Thank you! We'll notify you at {email} when {} is back in stock.",
                product.product_name
            ))?;
        }
        let try_again =
            self.terminal.prompt("Would you like to select a different product? (y/n): ")?;
        Ok(is_yes(&try_again))
    }

    async fn checkout(
        &mut self,
        product: ProductMatch,
        context: &FlowContext,
    ) -> Result<CheckoutOutcome, SessionError> {
        self.terminal
            .say(&format!("\nProcessing purchase for: {}", product.product_name))?;
        self.terminal.say(&format!("Price: ${}", product.price))?;

        let confirm =
            self.terminal.prompt("\nWould you like to proceed with this purchase? (y/n): ")?;
        if !is_yes(&confirm) {
            self.terminal.say("Purchase cancelled.")?;
            let try_again = self
                .terminal
                .prompt("Would you like to select a different product? (y/n): ")?;
            if is_yes(&try_again) {
                self.advance(FlowEvent::SelectionRetryRequested, context)?;
                return Ok(CheckoutOutcome::RetrySelection);
            }
            self.advance(FlowEvent::QuitRequested, context)?;
            return Ok(CheckoutOutcome::Abandoned);
        }

        self.terminal.say("\nPlease provide shipping information:")?;
        let customer = Customer {
            name: self.terminal.prompt("Full Name: ")?,
            address: self.terminal.prompt("Shipping Address: ")?,
            phone: self.terminal.prompt("Contact Phone: ")?,
        };

        self.terminal.say("\nPlease provide payment information:")?;
        let payment = Payment {
            card_type: self.terminal.prompt("Card Type (Visa/Mastercard/etc.): ")?,
            card_number: self.terminal.prompt("Card Number: ")?,
        };

        let order = self.confirm_order(product, customer, &payment).await;
        self.print_confirmation(&order)?;

        self.advance(FlowEvent::OrderPersisted, context)?;
        match cart::persist(&order, &self.cart_dir) {
            Ok(files) => {
                self.terminal.say("Cart saved successfully!")?;
                self.terminal.say(&format!("CSV File: {}", files.csv_path.display()))?;
                self.terminal.say(&format!("TXT File: {}", files.txt_path.display()))?;
            }
            Err(error) => {
                tracing::error!(%error, order_id = %order.order_id, "cart persistence failed");
                self.terminal.say(
                    "Your order was processed, but there was an issue saving the receipt.",
                )?;
                self.terminal.say(&format!("Error: {error}"))?;
            }
        }

        self.advance(FlowEvent::SummaryPresented, context)?;
        self.terminal.say(&format!("\n{BANNER}"))?;
        self.terminal.say("SHOPPING SESSION COMPLETE")?;
        self.terminal.say(BANNER)?;

        Ok(CheckoutOutcome::Completed(order.order_id))
    }

    /// Ask the cart role for a confirmation; any parse or transport problem
    /// falls back to a locally constructed order. The selected product and
    /// collected customer details always win over whatever the model echoed.
    async fn confirm_order(
        &mut self,
        product: ProductMatch,
        customer: Customer,
        payment: &Payment,
    ) -> Order {
        let today = Local::now().date_naive();
        match self.llm.execute(&prompts::cart_checkout(&product, &customer, payment)).await {
            Ok(reply) => match extract_as::<Order>(&reply, JsonShape::Object) {
                Ok(parsed) if !parsed.order_id.trim().is_empty() => Order {
                    order_id: parsed.order_id,
                    product,
                    customer,
                    payment_status: parsed.payment_status,
                    shipping_status: parsed.shipping_status,
                    estimated_delivery: parsed.estimated_delivery,
                },
                Ok(_) | Err(_) => {
                    tracing::debug!("cart reply had no usable order, building fallback");
                    Order::fallback(product, customer, today)
                }
            },
            Err(error) => {
                tracing::error!(%error, "cart agent call failed, building fallback order");
                Order::fallback(product, customer, today)
            }
        }
    }

    fn print_confirmation(&mut self, order: &Order) -> Result<(), SessionError> {
        self.terminal.say(&format!("\n{BANNER}"))?;
        self.terminal.say(&format!("ORDER CONFIRMATION - {}", order.order_id))?;
        self.terminal.say(BANNER)?;
        self.terminal.say(&format!("Thank you for your purchase, {}!", order.customer.name))?;
        self.terminal.say(&format!(
            "Your {} will be shipped to:",
            order.product.product_name
        ))?;
        self.terminal.say(&order.customer.address)?;
        self.terminal
            .say(&format!("\nEstimated delivery: {}", order.estimated_delivery))?;
        self.terminal.say(&format!("Payment status: {}", order.payment_status))?;
        self.terminal.say(BANNER)?;
        Ok(())
    }
}

enum CheckoutOutcome {
    Completed(String),
    RetrySelection,
    Abandoned,
}

enum SelectionChoice {
    Outcome(SelectionOutcome),
    Exhausted,
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y") || answer.trim().eq_ignore_ascii_case("yes")
}
