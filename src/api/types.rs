//! API request and response types

use crate::state_machine::state::{Session, Stage};
use serde::{Deserialize, Serialize};

/// Candidate message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Response for a newly created interview
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInterviewResponse {
    pub id: String,
    pub reply: String,
    pub stage: Stage,
}

/// Response for one candidate turn
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub reply: String,
    pub stage: Stage,
    pub session: Session,
}

/// Response with a single interview
#[derive(Debug, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub session: Session,
    pub total_score: f64,
}

/// Model information with metadata
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub description: String,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
    /// Model the interviewer is using
    pub active: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
