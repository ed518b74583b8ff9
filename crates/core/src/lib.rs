//! # Troupe Core
//!
//! Domain types, traits, and error definitions for the Troupe persona chat
//! backend. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The completion backend is defined as a trait here; implementations live
//! in `troupe-providers`. This enables:
//! - Swapping providers via configuration
//! - Easy testing with scripted mock clients
//! - Clean dependency graph (all crates depend inward on core)

pub mod conversation;
pub mod error;
pub mod persona;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use conversation::{ConversationKey, DerivedContext, Turn, TurnSummary, UserProfile};
pub use error::{Error, ProviderError, Result};
pub use persona::Persona;
pub use provider::{
    CompletionClient, CompletionRequest, CompletionResponse, Message, Role, Usage,
};
