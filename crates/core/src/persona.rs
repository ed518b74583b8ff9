//! Persona domain type.
//!
//! A persona is a named configuration that shapes outbound prompts:
//! a display name plus free-text personality and expertise descriptions.
//! Personas are loaded once at startup and never mutated.

use serde::{Deserialize, Serialize};

/// A named persona configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier, used as the URL path segment (e.g. "hook-creator").
    /// Not serialized: on the wire the id is the map key.
    #[serde(default, skip_serializing)]
    pub id: String,

    /// Human-facing display name (e.g. "Hook Creator").
    pub name: String,

    /// Free-text personality description, woven into the system prompt.
    pub personality: String,

    /// Free-text domain expertise, woven into the system prompt.
    pub expertise: String,
}

impl Persona {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        personality: impl Into<String>,
        expertise: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            personality: personality.into(),
            expertise: expertise.into(),
        }
    }
}
