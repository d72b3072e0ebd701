//! HTTP API for the interview assistant

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::llm::ModelRegistry;
use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            sessions,
            llm_registry,
        }
    }
}
