//! Error types for the Troupe domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Provider failures keep their own bounded-context enum so the gateway
//! can distinguish upstream trouble from caller mistakes.

use thiserror::Error;

/// The top-level error type for all Troupe operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller mistakes ---
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unknown persona: {0}")]
    PersonaNotFound(String),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures from the outbound completion call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn validation_error_displays_message() {
        let err = Error::Validation("message is required".into());
        assert!(err.to_string().contains("message is required"));
    }

    #[test]
    fn persona_not_found_names_the_persona() {
        let err = Error::PersonaNotFound("ghost-writer".into());
        assert!(err.to_string().contains("ghost-writer"));
    }
}
