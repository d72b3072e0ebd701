//! Mock implementations for testing
//!
//! These mocks enable runtime and API tests without network or disk I/O.

use super::traits::*;
use crate::llm::{LlmError, LlmRequest, LlmResponse};
use crate::state_machine::InterviewSnapshot;
use crate::store::StoreError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful text response
    pub fn queue_text(&self, text: impl Into<String>) {
        self.queue_response(LlmResponse::from_text(text));
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pending_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Snapshot Store
// ============================================================================

/// In-memory snapshot store that can be told to fail
#[derive(Default)]
pub struct MockSnapshotStore {
    /// Every snapshot handed to `save`, in order
    pub saved: Mutex<Vec<InterviewSnapshot>>,
    fail: AtomicBool,
}

impl MockSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<InterviewSnapshot> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStore for MockSnapshotStore {
    async fn save(&self, snapshot: &InterviewSnapshot) -> Result<String, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(format!("memory://{}", snapshot.session_id))
    }
}
