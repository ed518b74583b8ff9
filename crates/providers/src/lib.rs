//! Completion backend implementations for Troupe.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use std::sync::Arc;
use troupe_core::error::ProviderError;
use troupe_core::provider::CompletionClient;

/// Build the configured completion client.
///
/// Resolves the default provider's base URL and API key from config.
/// Fails with [`ProviderError::NotConfigured`] when no API key is
/// available, so a misconfigured deployment is caught at startup instead
/// of on the first chat request.
pub fn build_from_config(
    config: &troupe_config::AppConfig,
) -> Result<Arc<dyn CompletionClient>, ProviderError> {
    let name = config.default_provider.as_str();

    let api_key = config.api_key_for(name).ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "no API key for provider '{name}' — set TROUPE_API_KEY or configure [providers.{name}]"
        ))
    })?;

    let base_url = config
        .providers
        .get(name)
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    Ok(Arc::new(OpenAiCompatClient::new(name, base_url, api_key)))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "ai302" => "https://api.302.ai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
