//! Agent layer - LLM-backed shopping session orchestration
//!
//! This crate glues the deterministic core to an external text-completion
//! collaborator and a terminal:
//! - Extracts structured shopping intent from free text (`session`)
//! - Scores catalog candidates through the catalog role prompt (`prompts`)
//! - Produces and persists order confirmations via the cart role
//!
//! # Architecture
//!
//! The runner follows the fixed pipeline from `martley_core::flows`:
//! 1. **Intent Extraction** - free text -> `ShoppingQuery`
//! 2. **Catalog Search** - `ShoppingQuery` -> filtered `CatalogReply`
//! 3. **Selection / Checkout** - terminal-driven, bounded retries
//! 4. **Persistence / Summary** - cart files, then loop or end
//!
//! # Key Types
//!
//! - `SessionRunner` - drives one interactive session (see `session`)
//! - `LlmClient` - narrow capability trait: `execute(prompt) -> text`
//! - `Terminal` - blocking prompt/say pair the CLI implements over stdio
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator and matcher. Score filtering, result
//! caps, order invariants, and file formats are enforced by the core no
//! matter what the model replies.

pub mod client;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod terminal;
