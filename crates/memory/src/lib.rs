//! Conversation memory for Troupe.
//!
//! One process-lifetime [`ContextStore`] owns every conversation log and
//! user profile. State is explicitly volatile — nothing survives a restart.

pub mod store;

pub use store::{ContextStore, DEFAULT_MAX_TURNS, DEFAULT_RECENT_WINDOW};
