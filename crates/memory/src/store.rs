//! The context store — conversation logs, user profiles, and the derived
//! context view built from them.
//!
//! The store is the only stateful component in the system:
//!
//! - **Injectable**: constructed once at process start and shared via
//!   `Arc`; tests build fresh instances for isolation.
//! - **Append-only logs**: turns for a `(user, persona)` key are totally
//!   ordered by append time; prior turns are never mutated or reordered.
//! - **Derived reads**: the recent-context view is recomputed on every
//!   read. The log is cheap to window, so there is no second denormalized
//!   structure to invalidate.
//! - **Bounded**: each log is capped at `max_turns` with oldest-first
//!   eviction (0 disables the cap), so long-lived processes don't grow
//!   without bound.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use troupe_core::{ConversationKey, DerivedContext, Turn, TurnSummary, UserProfile};

/// How many trailing turns the derived context includes by default.
pub const DEFAULT_RECENT_WINDOW: usize = 5;

/// Default per-conversation retention cap.
pub const DEFAULT_MAX_TURNS: usize = 500;

/// Owns all conversation history and user profile data.
///
/// All mutation goes through [`append_turn`](Self::append_turn) and
/// [`merge_profile`](Self::merge_profile); both hold the write lock for
/// their full critical section, so concurrent calls on the same key never
/// lose updates.
pub struct ContextStore {
    inner: RwLock<Inner>,
    recent_window: usize,
    max_turns: usize,
}

#[derive(Default)]
struct Inner {
    conversations: HashMap<ConversationKey, Vec<Turn>>,
    profiles: HashMap<String, UserProfile>,
}

impl ContextStore {
    /// Create an empty store with the default window and retention cap.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            recent_window: DEFAULT_RECENT_WINDOW,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Set how many trailing turns the derived context includes.
    pub fn with_recent_window(mut self, window: usize) -> Self {
        self.recent_window = window.max(1);
        self
    }

    /// Set the per-conversation retention cap. `0` disables eviction.
    pub fn with_max_turns(mut self, cap: usize) -> Self {
        self.max_turns = cap;
        self
    }

    /// Derive the bounded context view for a `(user, persona)` pair.
    ///
    /// Side-effect-free; unknown keys yield empty defaults.
    pub async fn context(&self, user_id: &str, persona_id: &str) -> DerivedContext {
        let inner = self.inner.read().await;
        inner.derive(user_id, persona_id, self.recent_window)
    }

    /// Record a completed exchange at the end of the log for this key,
    /// creating the log if absent.
    ///
    /// The turn's context snapshot is derived under the same write lock,
    /// immediately before the push — it is exactly the context a reader
    /// would have seen prior to this exchange. When the log exceeds the
    /// retention cap the oldest turns are evicted.
    pub async fn append_turn(
        &self,
        user_id: &str,
        persona_id: &str,
        message: impl Into<String>,
        response: impl Into<String>,
    ) {
        let mut inner = self.inner.write().await;
        let context = inner.derive(user_id, persona_id, self.recent_window);

        let key = ConversationKey::new(user_id, persona_id);
        let log = inner.conversations.entry(key).or_default();
        log.push(Turn {
            timestamp: Utc::now(),
            message: message.into(),
            response: response.into(),
            context,
        });

        if self.max_turns > 0 && log.len() > self.max_turns {
            let excess = log.len() - self.max_turns;
            log.drain(..excess);
            debug!(user = user_id, persona = persona_id, evicted = excess, "Evicted oldest turns");
        }
    }

    /// Shallow-merge `patch` into the user's profile, creating an empty
    /// profile first if none exists. Keys in `patch` overwrite same-named
    /// keys; all other existing keys survive. Returns the post-merge
    /// profile.
    pub async fn merge_profile(&self, user_id: &str, patch: UserProfile) -> UserProfile {
        let mut inner = self.inner.write().await;
        let profile = inner.profiles.entry(user_id.to_string()).or_default();
        for (key, value) in patch {
            profile.insert(key, value);
        }
        profile.clone()
    }

    /// Read a user's profile. Empty mapping if unknown.
    pub async fn profile(&self, user_id: &str) -> UserProfile {
        let inner = self.inner.read().await;
        inner.profiles.get(user_id).cloned().unwrap_or_default()
    }

    /// Read the full retained log for a `(user, persona)` pair, in append
    /// order. Empty if unknown.
    pub async fn history(&self, user_id: &str, persona_id: &str) -> Vec<Turn> {
        let inner = self.inner.read().await;
        inner
            .conversations
            .get(&ConversationKey::new(user_id, persona_id))
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn derive(&self, user_id: &str, persona_id: &str, window: usize) -> DerivedContext {
        let profile = self.profiles.get(user_id).cloned().unwrap_or_default();
        let log = self
            .conversations
            .get(&ConversationKey::new(user_id, persona_id));

        let total_turns = log.map_or(0, Vec::len);
        let recent_turns = log
            .map(|turns| {
                turns[turns.len().saturating_sub(window)..]
                    .iter()
                    .map(TurnSummary::from)
                    .collect()
            })
            .unwrap_or_default();

        DerivedContext {
            profile,
            recent_turns,
            total_turns,
        }
    }
}
