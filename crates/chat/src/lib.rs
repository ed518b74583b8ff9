//! The chat orchestration engine.
//!
//! [`ChatEngine`] coordinates one inbound chat request end to end:
//! resolve the persona, derive the conversation context, compose the
//! prompt, call the completion backend, and record the completed turn.
//! It is the only component that writes to the context store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use troupe_core::{
    CompletionClient, CompletionRequest, ConversationKey, Error, Message, Result, Turn,
    UserProfile,
};
use troupe_memory::ContextStore;
use troupe_personas::{PersonaRegistry, PromptComposer};

/// The outcome of a successful chat exchange.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Display name of the persona that answered.
    pub persona_name: String,

    /// The generated response text.
    pub response: String,

    /// When the exchange completed.
    pub timestamp: DateTime<Utc>,

    /// The conversation this turn was recorded under.
    pub conversation_key: ConversationKey,
}

/// Everything the store holds about one user, for the memory-inspection
/// surface. Serialized with the service's wire names.
#[derive(Debug, Clone, Serialize)]
pub struct UserMemory {
    #[serde(rename = "userId")]
    pub user_id: String,

    pub profile: UserProfile,

    /// One entry per registered persona, empty logs included.
    pub conversations: serde_json::Map<String, serde_json::Value>,

    #[serde(rename = "totalInteractions")]
    pub total_interactions: usize,
}

/// Coordinates the persona registry, context store, prompt composer, and
/// completion client for each request.
pub struct ChatEngine {
    client: Arc<dyn CompletionClient>,
    registry: Arc<PersonaRegistry>,
    store: Arc<ContextStore>,
    composer: PromptComposer,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatEngine {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        registry: Arc<PersonaRegistry>,
        store: Arc<ContextStore>,
        composer: PromptComposer,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            registry,
            store,
            composer,
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    /// Set the max tokens per completion.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Handle one chat request.
    ///
    /// A turn is recorded **only** when the completion call fully
    /// succeeds; validation failures, unknown personas, and provider
    /// errors all leave the store untouched.
    pub async fn handle_chat(
        &self,
        persona_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(Error::Validation("message is required".into()));
        }

        let persona = self
            .registry
            .lookup(persona_id)
            .ok_or_else(|| Error::PersonaNotFound(persona_id.to_string()))?
            .clone();

        let context = self.store.context(user_id, persona_id).await;
        debug!(
            persona = persona_id,
            user = user_id,
            prior_turns = context.total_turns,
            "Composing prompt"
        );

        let prompt = self.composer.compose(&persona, message, &context);
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::system(prompt.system), Message::user(prompt.user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let completion = self.client.complete(request).await?;

        self.store
            .append_turn(user_id, persona_id, message, completion.content.as_str())
            .await;

        info!(persona = persona_id, user = user_id, "Chat turn recorded");

        Ok(ChatReply {
            persona_name: persona.name,
            response: completion.content,
            timestamp: Utc::now(),
            conversation_key: ConversationKey::new(user_id, persona_id),
        })
    }

    /// Merge a profile patch for a user.
    ///
    /// The patch must be a JSON object; the profile schema itself is open,
    /// so no keys are rejected.
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: serde_json::Value,
    ) -> Result<UserProfile> {
        match patch {
            serde_json::Value::Object(map) => Ok(self.store.merge_profile(user_id, map).await),
            _ => Err(Error::Validation(
                "profile patch must be a JSON object".into(),
            )),
        }
    }

    /// Everything the store holds about a user: profile plus the full log
    /// for every registered persona.
    pub async fn memory_snapshot(&self, user_id: &str) -> Result<UserMemory> {
        let profile = self.store.profile(user_id).await;

        let mut conversations = serde_json::Map::new();
        let mut total_interactions = 0;
        for persona in self.registry.list() {
            let history = self.store.history(user_id, &persona.id).await;
            total_interactions += history.len();
            conversations.insert(persona.id.clone(), serde_json::to_value(&history)?);
        }

        Ok(UserMemory {
            user_id: user_id.to_string(),
            profile,
            conversations,
            total_interactions,
        })
    }

    /// Full history for one `(user, persona)` pair.
    pub async fn history(&self, user_id: &str, persona_id: &str) -> Vec<Turn> {
        self.store.history(user_id, persona_id).await
    }

    /// The persona registry this engine resolves against.
    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use troupe_core::error::ProviderError;
    use troupe_core::provider::CompletionResponse;

    /// A scripted completion client: returns a fixed response or error and
    /// records every request it receives.
    struct MockClient {
        response: std::result::Result<String, ProviderError>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockClient {
        fn replying(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: ProviderError) -> Self {
            Self {
                response: Err(error),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for MockClient {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.response.clone().map(|content| CompletionResponse {
                content,
                model: "mock-model".into(),
                usage: None,
            })
        }
    }

    fn engine_with(client: Arc<MockClient>) -> ChatEngine {
        ChatEngine::new(
            client,
            Arc::new(PersonaRegistry::builtin()),
            Arc::new(ContextStore::new()),
            PromptComposer::default(),
            "mock-model",
            0.7,
        )
        .with_max_tokens(1000)
    }

    #[tokio::test]
    async fn successful_chat_records_one_turn() {
        let client = Arc::new(MockClient::replying("☕ Stop scrolling..."));
        let engine = engine_with(client.clone());

        let reply = engine
            .handle_chat("hook-creator", "u1", "Write a hook about coffee")
            .await
            .unwrap();

        assert_eq!(reply.persona_name, "Hook Creator");
        assert_eq!(reply.response, "☕ Stop scrolling...");
        assert_eq!(reply.conversation_key.to_string(), "u1_hook-creator");

        let history = engine.history("u1", "hook-creator").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Write a hook about coffee");
        assert_eq!(history[0].response, "☕ Stop scrolling...");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_message_never_reaches_the_provider() {
        let client = Arc::new(MockClient::replying("unused"));
        let engine = engine_with(client.clone());

        for message in ["", "   ", "\n\t"] {
            let err = engine
                .handle_chat("hook-creator", "u1", message)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        assert_eq!(client.call_count(), 0);
        assert!(engine.history("u1", "hook-creator").await.is_empty());
    }

    #[tokio::test]
    async fn unknown_persona_is_not_found_and_mutates_nothing() {
        let client = Arc::new(MockClient::replying("unused"));
        let engine = engine_with(client.clone());

        let err = engine
            .handle_chat("ghost-writer", "u1", "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PersonaNotFound(_)));
        assert_eq!(client.call_count(), 0);
        assert!(engine.history("u1", "ghost-writer").await.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_leaves_the_store_untouched() {
        let ok_client = Arc::new(MockClient::replying("first"));
        let engine = engine_with(ok_client);
        engine.handle_chat("data-analyst", "u1", "hi").await.unwrap();
        let store = engine.store.clone();

        // Same store, now with a failing client.
        let failing = Arc::new(MockClient::failing(ProviderError::ApiError {
            status_code: 500,
            message: "upstream down".into(),
        }));
        let engine = ChatEngine::new(
            failing.clone(),
            Arc::new(PersonaRegistry::builtin()),
            store,
            PromptComposer::default(),
            "mock-model",
            0.7,
        );

        let before = engine.history("u1", "data-analyst").await.len();
        let err = engine
            .handle_chat("data-analyst", "u1", "again")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(failing.call_count(), 1);
        assert_eq!(engine.history("u1", "data-analyst").await.len(), before);
    }

    #[tokio::test]
    async fn second_turn_sees_the_first_in_its_prompt() {
        let client = Arc::new(MockClient::replying("¡Claro que sí!"));
        let engine = engine_with(client.clone());

        engine
            .handle_chat("community-manager", "u1", "primer mensaje")
            .await
            .unwrap();
        engine
            .handle_chat("community-manager", "u1", "segundo mensaje")
            .await
            .unwrap();

        let request = client.last_request();
        let user_prompt = &request.messages[1].content;
        assert!(user_prompt.contains("primer mensaje"));
        assert!(user_prompt.contains("¡Claro que sí!"));
        assert!(user_prompt.contains("\"totalInteractions\": 1"));
        assert!(user_prompt.contains("CURRENT MESSAGE: segundo mensaje"));
    }

    #[tokio::test]
    async fn profile_patch_must_be_an_object() {
        let engine = engine_with(Arc::new(MockClient::replying("unused")));

        let merged = engine
            .update_profile("u1", serde_json::json!({"niche": "coffee"}))
            .await
            .unwrap();
        assert_eq!(merged["niche"], "coffee");

        for bad in [
            serde_json::json!("just a string"),
            serde_json::json!([1, 2, 3]),
            serde_json::json!(null),
        ] {
            let err = engine.update_profile("u1", bad).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        // Rejected patches never partially applied
        assert_eq!(engine.store.profile("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn memory_snapshot_covers_every_persona() {
        let client = Arc::new(MockClient::replying("ok"));
        let engine = engine_with(client);

        engine.handle_chat("hook-creator", "u1", "uno").await.unwrap();
        engine.handle_chat("hook-creator", "u1", "dos").await.unwrap();
        engine.handle_chat("data-analyst", "u1", "tres").await.unwrap();
        engine
            .update_profile("u1", serde_json::json!({"plan": "pro"}))
            .await
            .unwrap();

        let memory = engine.memory_snapshot("u1").await.unwrap();
        assert_eq!(memory.user_id, "u1");
        assert_eq!(memory.total_interactions, 3);
        assert_eq!(memory.conversations.len(), 8);
        assert_eq!(
            memory.conversations["hook-creator"].as_array().unwrap().len(),
            2
        );
        assert!(memory.conversations["viral-optimizer"]
            .as_array()
            .unwrap()
            .is_empty());
        assert_eq!(memory.profile["plan"], "pro");
    }
}
