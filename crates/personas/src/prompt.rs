//! Prompt composition — turns a persona, a derived context, and the
//! current message into the outbound system/user prompt pair.
//!
//! Pure templating: no conditional logic beyond persona substitution, and
//! no failure modes.

use troupe_core::{DerivedContext, Persona};

/// The composed system/user prompt pair sent to the completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

/// Builds outbound prompts for a configured response language.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    response_language: String,
}

impl PromptComposer {
    pub fn new(response_language: impl Into<String>) -> Self {
        Self {
            response_language: response_language.into(),
        }
    }

    /// Compose the prompt pair for one chat exchange.
    ///
    /// The system prompt carries the persona identity and the fixed
    /// behavioral instructions; the user prompt embeds the serialized
    /// context followed by the literal current message.
    pub fn compose(
        &self,
        persona: &Persona,
        user_message: &str,
        context: &DerivedContext,
    ) -> ComposedPrompt {
        let system = format!(
            "You are {name}, a specialized AI persona.\n\
             \n\
             PERSONALITY: {personality}\n\
             EXPERTISE: {expertise}\n\
             \n\
             INSTRUCTIONS:\n\
             - ALWAYS respond in {language}\n\
             - Stay in character and keep your personality consistent\n\
             - Use your expertise to give valuable answers\n\
             - Be conversational but professional\n\
             - Adapt your tone to your specific personality",
            name = persona.name,
            personality = persona.personality,
            expertise = persona.expertise,
            language = self.response_language,
        );

        // DerivedContext is plain data; pretty-printing it cannot fail.
        let context_json = serde_json::to_string_pretty(context).unwrap_or_default();

        let user = format!(
            "USER CONTEXT:\n\
             {context_json}\n\
             \n\
             CURRENT MESSAGE: {user_message}\n\
             \n\
             Answer taking the full context and your personality into account.",
        );

        ComposedPrompt { system, user }
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new("Spanish")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_core::UserProfile;

    fn persona() -> Persona {
        Persona::new(
            "hook-creator",
            "Hook Creator",
            "Creativo, persuasivo",
            "Copywriting, hooks virales",
        )
    }

    #[test]
    fn system_prompt_embeds_persona_identity() {
        let composer = PromptComposer::default();
        let prompt = composer.compose(&persona(), "hola", &DerivedContext::default());

        assert!(prompt.system.contains("You are Hook Creator"));
        assert!(prompt.system.contains("PERSONALITY: Creativo, persuasivo"));
        assert!(prompt.system.contains("EXPERTISE: Copywriting, hooks virales"));
        assert!(prompt.system.contains("respond in Spanish"));
    }

    #[test]
    fn response_language_is_configurable() {
        let composer = PromptComposer::new("English");
        let prompt = composer.compose(&persona(), "hi", &DerivedContext::default());
        assert!(prompt.system.contains("respond in English"));
    }

    #[test]
    fn user_prompt_embeds_context_then_message() {
        let mut profile = UserProfile::new();
        profile.insert("niche".into(), serde_json::json!("coffee"));
        let context = DerivedContext {
            profile,
            recent_turns: vec![],
            total_turns: 4,
        };

        let composer = PromptComposer::default();
        let prompt = composer.compose(&persona(), "Write a hook about coffee", &context);

        assert!(prompt.user.starts_with("USER CONTEXT:"));
        assert!(prompt.user.contains("\"niche\": \"coffee\""));
        assert!(prompt.user.contains("\"totalInteractions\": 4"));
        assert!(prompt.user.contains("CURRENT MESSAGE: Write a hook about coffee"));

        let context_pos = prompt.user.find("USER CONTEXT").unwrap();
        let message_pos = prompt.user.find("CURRENT MESSAGE").unwrap();
        assert!(context_pos < message_pos);
    }
}
