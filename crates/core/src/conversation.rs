//! Conversation memory domain types.
//!
//! These are the value objects the context store is built from:
//! a user talks to a persona → each exchange becomes a [`Turn`] in that
//! pair's log → the log plus the user's profile is windowed into a
//! [`DerivedContext`] that shapes the next outbound prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one conversation log: a `(user, persona)` pair.
///
/// Both components are case-sensitive exact strings; no normalization is
/// applied. The wire form is `"{user_id}_{persona_id}"` — display only,
/// never parsed back (user ids may themselves contain underscores).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: String,
    pub persona_id: String,
}

impl ConversationKey {
    pub fn new(user_id: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            persona_id: persona_id.into(),
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.user_id, self.persona_id)
    }
}

/// Durable facts about a user, independent of persona.
///
/// An open key→value schema mutated by shallow merge; unknown users have
/// the empty profile, never an error.
pub type UserProfile = serde_json::Map<String, serde_json::Value>;

/// One recorded message/response exchange. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// When the exchange completed.
    pub timestamp: DateTime<Utc>,

    /// The user's message.
    pub message: String,

    /// The persona's generated response.
    pub response: String,

    /// The derived context that was visible *before* this turn was
    /// appended. Captured for audit and debugging, never fed back into
    /// later prompts.
    pub context: DerivedContext,
}

/// A turn as embedded in a derived context: the exchange itself, without
/// the audit snapshot.
///
/// Embedding full [`Turn`]s would nest snapshots inside snapshots and make
/// every stored turn (and every serialized prompt) grow without bound as a
/// conversation ages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub response: String,
}

impl From<&Turn> for TurnSummary {
    fn from(turn: &Turn) -> Self {
        Self {
            timestamp: turn.timestamp,
            message: turn.message.clone(),
            response: turn.response.clone(),
        }
    }
}

/// The bounded, recomputed view of a conversation supplied to prompt
/// construction. A view, not a source of truth — recomputed on every read
/// and never stored on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedContext {
    /// The user's profile at read time.
    pub profile: UserProfile,

    /// Suffix of the conversation log, length `min(window, total_turns)`.
    #[serde(rename = "recentInteractions")]
    pub recent_turns: Vec<TurnSummary>,

    /// Total retained turns in the log.
    #[serde(rename = "totalInteractions")]
    pub total_turns: usize,
}
