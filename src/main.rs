//! Talent Scout hiring assistant
//!
//! A scripted screening interview served over HTTP: collect the candidate's
//! profile and tech stack, quiz them per technology, then save the result.

mod api;
mod config;
mod db;
mod llm;
mod quiz;
mod runtime;
mod state_machine;
mod store;
mod system_prompt;

use api::{create_router, AppState};
use config::{ensure_models, AppConfig, StoreKind};
use llm::ModelRegistry;
use runtime::{
    InterviewRuntime, LlmClient, RegistryLlmClient, SessionManager, SnapshotStore, TurnSettings,
};
use state_machine::InterviewContext;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{FileSnapshotStore, SqliteSnapshotStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talent_scout=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    // Initialize LLM registry; the interview cannot run without a model
    let llm_registry = Arc::new(ModelRegistry::new(&config.llm));
    ensure_models(&llm_registry).inspect_err(|e| tracing::error!(error = %e, "Cannot start"))?;
    tracing::info!(
        models = ?llm_registry.available_models(),
        default = %llm_registry.default_model_id(),
        "LLM registry initialized"
    );

    // Snapshot storage
    let store: Arc<dyn SnapshotStore> = match config.store {
        StoreKind::File => {
            tracing::info!(dir = %config.data_dir.display(), "Saving interviews as JSON files");
            Arc::new(FileSnapshotStore::new(&config.data_dir))
        }
        StoreKind::Sqlite => {
            tracing::info!(path = %config.db_path.display(), "Opening database");
            Arc::new(SqliteSnapshotStore::open(&config.db_path)?)
        }
    };

    let llm: Arc<dyn LlmClient> = Arc::new(RegistryLlmClient::new(
        llm_registry.clone(),
        llm_registry.default_model_id().to_string(),
    ));
    let runtime = InterviewRuntime::new(
        InterviewContext::new(config.keywords.clone()),
        TurnSettings {
            history_window: config.history_window,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        },
        llm,
        store,
    );

    // Create application state
    let state = AppState::new(
        Arc::new(SessionManager::new(Arc::new(runtime))),
        llm_registry,
    );

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("TalentScout server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
