//! `troupe personas` — List the persona registry.

use troupe_config::AppConfig;
use troupe_personas::PersonaRegistry;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = PersonaRegistry::builtin().with_extra(config.extra_personas());

    println!("Personas ({}):", registry.len());
    println!();
    for persona in registry.list() {
        println!("  {} — {}", persona.id, persona.name);
        println!("      personality: {}", persona.personality);
        println!("      expertise:   {}", persona.expertise);
    }

    Ok(())
}
