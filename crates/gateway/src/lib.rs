//! HTTP API gateway for Troupe.
//!
//! Exposes the persona chat REST API:
//!
//! - `GET  /`                              — service index
//! - `GET  /health`                        — health check
//! - `GET  /api/agents`                    — list personas
//! - `POST /api/chat/{agent_id}`           — chat with a persona
//! - `GET  /api/memory/{user_id}`          — inspect a user's memory
//! - `POST /api/memory/{user_id}/profile`  — merge a profile patch
//!
//! Built on Axum. The route vocabulary ("agents", `conversationId`) is the
//! service's public wire contract; internally these are personas and
//! conversation keys.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};

use troupe_chat::{ChatEngine, UserMemory};
use troupe_core::Error;
use troupe_memory::ContextStore;
use troupe_personas::{PersonaRegistry, PromptComposer};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ChatEngine>,
    pub start_time: chrono::DateTime<Utc>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/agents", get(list_agents_handler))
        .route("/api/chat/{agent_id}", post(chat_handler))
        .route("/api/memory/{user_id}", get(memory_handler))
        .route("/api/memory/{user_id}/profile", post(profile_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok()),
        ))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Builds the registry, store, composer, and completion client once from
/// config and shares them across all requests.
pub async fn start(config: troupe_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let client = troupe_providers::build_from_config(&config)?;
    let registry = Arc::new(PersonaRegistry::builtin().with_extra(config.extra_personas()));
    let store = Arc::new(
        ContextStore::new()
            .with_recent_window(config.memory.recent_window)
            .with_max_turns(config.memory.max_turns),
    );
    let composer = PromptComposer::new(&config.response_language);

    let engine = Arc::new(
        ChatEngine::new(
            client,
            registry,
            store,
            composer,
            &config.default_model,
            config.default_temperature,
        )
        .with_max_tokens(config.default_max_tokens),
    );

    let state = Arc::new(GatewayState {
        engine,
        start_time: Utc::now(),
    });

    let app = build_router(state, &config.gateway.cors_origins);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    /// The user's message.
    #[serde(default)]
    message: String,

    /// Caller identity; conversations are tracked per user.
    #[serde(rename = "userId", default = "default_user_id")]
    user_id: String,
}

fn default_user_id() -> String {
    "anonymous".into()
}

#[derive(Serialize)]
struct ChatResponse {
    agent: String,
    response: String,
    timestamp: String,
    #[serde(rename = "conversationId")]
    conversation_id: String,
}

#[derive(Serialize)]
struct IndexResponse {
    message: &'static str,
    version: &'static str,
    agents: Vec<String>,
    endpoints: serde_json::Value,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    #[serde(rename = "uptimeSecs")]
    uptime_secs: i64,
}

#[derive(Serialize)]
struct AgentListResponse {
    agents: serde_json::Map<String, serde_json::Value>,
    total: usize,
}

#[derive(Serialize)]
struct ProfileUpdateResponse {
    message: &'static str,
    #[serde(rename = "userId")]
    user_id: String,
    profile: troupe_core::UserProfile,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Map a domain error onto the wire envelope.
///
/// Provider failures are 502 (the upstream broke, not us); anything
/// unexpected is a plain 500.
fn error_reply(err: Error) -> ErrorReply {
    let (status, error, details) = match &err {
        Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
        Error::PersonaNotFound(_) => (StatusCode::NOT_FOUND, "Agent not found".into(), None),
        Error::Provider(provider_err) => (
            StatusCode::BAD_GATEWAY,
            "Completion provider failed".into(),
            Some(provider_err.to_string()),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".into(),
            Some(err.to_string()),
        ),
    };

    if status.is_server_error() {
        error!(status = %status, error = %err, "Request failed");
    }

    (status, Json(ErrorResponse { error, details }))
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn index_handler(State(state): State<SharedState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Troupe backend — multi-persona chat with conversation memory",
        version: env!("CARGO_PKG_VERSION"),
        agents: state
            .engine
            .registry()
            .ids()
            .into_iter()
            .map(String::from)
            .collect(),
        endpoints: serde_json::json!({
            "agents": "/api/agents",
            "chat": "/api/chat/:agentId",
            "memory": "/api/memory/:userId",
            "health": "/health",
        }),
    })
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "healthy",
        timestamp: now.to_rfc3339(),
        uptime_secs: (now - state.start_time).num_seconds(),
    })
}

async fn list_agents_handler(State(state): State<SharedState>) -> Json<AgentListResponse> {
    let registry = state.engine.registry();

    let mut agents = serde_json::Map::new();
    for persona in registry.list() {
        // Serializing a persona cannot fail; it is a struct of strings.
        let value = serde_json::to_value(persona).unwrap_or_default();
        agents.insert(persona.id.clone(), value);
    }

    Json(AgentListResponse {
        total: agents.len(),
        agents,
    })
}

async fn chat_handler(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ErrorReply> {
    info!(persona = %agent_id, user = %payload.user_id, "Chat request");

    let reply = state
        .engine
        .handle_chat(&agent_id, &payload.user_id, &payload.message)
        .await
        .map_err(error_reply)?;

    Ok(Json(ChatResponse {
        agent: reply.persona_name,
        response: reply.response,
        timestamp: reply.timestamp.to_rfc3339(),
        conversation_id: reply.conversation_key.to_string(),
    }))
}

async fn memory_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserMemory>, ErrorReply> {
    let memory = state
        .engine
        .memory_snapshot(&user_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(memory))
}

async fn profile_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<ProfileUpdateResponse>, ErrorReply> {
    let profile = state
        .engine
        .update_profile(&user_id, patch)
        .await
        .map_err(error_reply)?;

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated",
        user_id,
        profile,
    }))
}
