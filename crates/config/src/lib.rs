//! Configuration loading, validation, and management for Troupe.
//!
//! Loads configuration from `~/.troupe/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use troupe_core::Persona;

/// The root configuration structure.
///
/// Maps directly to `~/.troupe/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion backend (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion backend
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Language personas answer in
    #[serde(default = "default_response_language")]
    pub response_language: String,

    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Extra persona definitions (same-id entries override built-ins)
    #[serde(default)]
    pub personas: Vec<PersonaConfig>,
}

fn default_provider() -> String {
    "ai302".into()
}
fn default_model() -> String {
    "doubao-1.5-pro".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_response_language() -> String {
    "Spanish".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("response_language", &self.response_language)
            .field("memory", &self.memory)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .field("personas", &self.personas)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Retained turns per conversation; 0 = unbounded
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Trailing turns included in the derived context
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_max_turns() -> usize {
    500
}
fn default_recent_window() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            recent_window: default_recent_window(),
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Per-provider overrides.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A persona defined in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub expertise: String,
}

impl From<&PersonaConfig> for Persona {
    fn from(config: &PersonaConfig) -> Self {
        Persona::new(&config.id, &config.name, &config.personality, &config.expertise)
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl AppConfig {
    /// Load configuration from the default path (~/.troupe/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `TROUPE_API_KEY` (highest priority)
    /// - `AI_302_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("TROUPE_API_KEY")
                .ok()
                .or_else(|| std::env::var("AI_302_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("TROUPE_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("TROUPE_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".troupe")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.recent_window == 0 {
            return Err(ConfigError::ValidationError(
                "memory.recent_window must be at least 1".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for persona in &self.personas {
            if persona.id.trim().is_empty() || persona.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "persona entries need a non-empty id and name".into(),
                ));
            }
            if !seen.insert(persona.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate persona id: {}",
                    persona.id
                )));
            }
        }

        Ok(())
    }

    /// Resolve the API key for a given provider (provider section first,
    /// then the top-level key).
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Extra personas as domain values.
    pub fn extra_personas(&self) -> Vec<Persona> {
        self.personas.iter().map(Persona::from).collect()
    }

    /// Generate a default config TOML string (for `troupe init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            response_language: default_response_language(),
            memory: MemoryConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
            personas: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_target_the_doubao_endpoint() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "ai302");
        assert_eq!(config.default_model, "doubao-1.5-pro");
        assert_eq!(config.default_max_tokens, 1000);
        assert_eq!(config.response_language, "Spanish");
        assert_eq!(config.memory.recent_window, 5);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.gateway.port, 8787);
    }

    #[test]
    fn parses_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o"

[gateway]
port = 9000
cors_origins = ["https://example.com"]

[[personas]]
id = "pirate"
name = "Pirate"
personality = "Gruff"
expertise = "Sailing"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.memory.max_turns, 500);
        assert_eq!(config.extra_personas()[0].id, "pirate");
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let config = AppConfig {
            default_temperature: 3.5,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_persona_ids() {
        let persona = PersonaConfig {
            id: "dup".into(),
            name: "Dup".into(),
            personality: "p".into(),
            expertise: "e".into(),
        };
        let config = AppConfig {
            personas: vec![persona.clone(), persona],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn api_key_resolution_prefers_provider_section() {
        let mut config = AppConfig {
            api_key: Some("top".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "ai302".into(),
            ProviderConfig {
                api_key: Some("scoped".into()),
                api_url: None,
                model: None,
            },
        );
        assert_eq!(config.api_key_for("ai302").as_deref(), Some("scoped"));
        assert_eq!(config.api_key_for("openai").as_deref(), Some("top"));
    }
}
