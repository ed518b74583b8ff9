//! The persona registry — a fixed, ordered set of persona configurations.
//!
//! Loaded once at process start; lookup is exact-match on the id, and an
//! unknown id is a typed "not found" outcome, never an access into
//! undefined configuration.

use tracing::debug;
use troupe_core::Persona;

/// Ordered collection of personas with exact-match lookup by id.
///
/// Backed by a `Vec`: the set is small (eight built-ins) and listing order
/// is part of the public surface.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// The built-in persona set.
    pub fn builtin() -> Self {
        Self {
            personas: vec![
                Persona::new(
                    "troupe-ceo",
                    "Troupe CEO",
                    "Visionario estratégico, líder inspirador, enfocado en crecimiento exponencial",
                    "Estrategia empresarial, liderazgo, innovación, toma de decisiones ejecutivas",
                ),
                Persona::new(
                    "trend-researcher",
                    "Trend Researcher",
                    "Analítico, curioso, siempre al día con las últimas tendencias",
                    "Investigación de mercado, análisis de tendencias, predicción de comportamientos",
                ),
                Persona::new(
                    "hook-creator",
                    "Hook Creator",
                    "Creativo, persuasivo, experto en captar atención instantánea",
                    "Copywriting, hooks virales, engagement, psicología del consumidor",
                ),
                Persona::new(
                    "content-strategist",
                    "Content Strategist",
                    "Planificador meticuloso, creativo, orientado a resultados",
                    "Estrategia de contenido, planificación editorial, storytelling",
                ),
                Persona::new(
                    "viral-optimizer",
                    "Viral Optimizer",
                    "Obsesivo con métricas, experimentador, growth hacker",
                    "Optimización viral, A/B testing, métricas de engagement, algoritmos",
                ),
                Persona::new(
                    "community-manager",
                    "Community Manager",
                    "Empático, comunicativo, constructor de relaciones",
                    "Gestión de comunidades, engagement, atención al cliente, moderación",
                ),
                Persona::new(
                    "data-analyst",
                    "Data Analyst",
                    "Meticuloso, objetivo, orientado a datos y insights",
                    "Análisis de datos, métricas, reporting, insights de comportamiento",
                ),
                Persona::new(
                    "automation-expert",
                    "Automation Expert",
                    "Eficiente, sistemático, obsesivo con la optimización",
                    "Automatización de procesos, workflows, integración de herramientas",
                ),
            ],
        }
    }

    /// Extend the built-in set with configured personas.
    ///
    /// An extra persona whose id matches an existing entry replaces it in
    /// place (keeping its position); new ids are appended in their given
    /// order.
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = Persona>) -> Self {
        for persona in extra {
            match self.personas.iter_mut().find(|p| p.id == persona.id) {
                Some(existing) => {
                    debug!(id = %persona.id, "Overriding built-in persona");
                    *existing = persona;
                }
                None => self.personas.push(persona),
            }
        }
        self
    }

    /// Exact-match lookup by id. Case-sensitive, no normalization.
    pub fn lookup(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// All personas, in registration order.
    pub fn list(&self) -> &[Persona] {
        &self.personas
    }

    /// All persona ids, in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_has_eight_personas() {
        let registry = PersonaRegistry::builtin();
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn lookup_finds_known_ids() {
        let registry = PersonaRegistry::builtin();
        let persona = registry.lookup("hook-creator").unwrap();
        assert_eq!(persona.name, "Hook Creator");
        assert!(persona.expertise.contains("Copywriting"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = PersonaRegistry::builtin();
        assert!(registry.lookup("Hook-Creator").is_none());
        assert!(registry.lookup("unknown").is_none());
    }

    #[test]
    fn extra_personas_append_in_order() {
        let registry = PersonaRegistry::builtin()
            .with_extra([Persona::new("pirate", "Pirate", "Gruff", "Sailing")]);
        assert_eq!(registry.len(), 9);
        assert_eq!(registry.list().last().unwrap().id, "pirate");
    }

    #[test]
    fn extra_persona_with_known_id_replaces_in_place() {
        let registry = PersonaRegistry::builtin().with_extra([Persona::new(
            "hook-creator",
            "Hook Creator v2",
            "Calm",
            "Headlines",
        )]);
        assert_eq!(registry.len(), 8);
        let persona = registry.lookup("hook-creator").unwrap();
        assert_eq!(persona.name, "Hook Creator v2");
        // Position is preserved
        assert_eq!(registry.list()[2].id, "hook-creator");
    }
}
