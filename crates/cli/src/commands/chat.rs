//! `troupe chat` — Send a single message to a persona.

use std::sync::Arc;

use troupe_chat::ChatEngine;
use troupe_config::AppConfig;
use troupe_memory::ContextStore;
use troupe_personas::{PersonaRegistry, PromptComposer};

pub async fn run(persona: &str, message: &str, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for an API key early — give a clear error before dialing out.
    // `load()` already folds the env vars into the config.
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TROUPE_API_KEY  (generic)");
        eprintln!("    AI_302_API_KEY  (for the 302.ai endpoint)");
        eprintln!("    OPENAI_API_KEY  (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let client = troupe_providers::build_from_config(&config)?;
    let registry = Arc::new(PersonaRegistry::builtin().with_extra(config.extra_personas()));
    let store = Arc::new(
        ContextStore::new()
            .with_recent_window(config.memory.recent_window)
            .with_max_turns(config.memory.max_turns),
    );

    let engine = ChatEngine::new(
        client,
        registry,
        store,
        PromptComposer::new(&config.response_language),
        &config.default_model,
        config.default_temperature,
    )
    .with_max_tokens(config.default_max_tokens);

    let reply = engine.handle_chat(persona, user, message).await?;

    println!("[{}]", reply.persona_name);
    println!("{}", reply.response);

    Ok(())
}
