//! Runtime for running interviews
//!
//! Each interview is an owned [`Session`] behind its own async mutex, so
//! turns within one interview are serialized while separate interviews run
//! independently.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{InterviewRuntime, TurnOutcome, TurnSettings, FALLBACK_REPLY};
pub use traits::*;

use crate::state_machine::state::{Session, Stage};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Runtime type used by the server; tests swap in mocks behind the same objects
pub type ProductionRuntime = InterviewRuntime<Arc<dyn LlmClient>, Arc<dyn SnapshotStore>>;

/// Handle to one live interview
pub type SessionHandle = Arc<Mutex<Session>>;

/// How many ended interviews stay readable after they leave the live map
pub const FINISHED_CAPACITY: usize = 128;

/// Manager for all live interviews
///
/// An interview that reaches `ending` is dropped from the live map and kept
/// read-only in a bounded cache, oldest evicted first.
pub struct SessionManager {
    runtime: Arc<ProductionRuntime>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    finished: RwLock<FinishedSessions>,
}

impl SessionManager {
    pub fn new(runtime: Arc<ProductionRuntime>) -> Self {
        Self::with_finished_capacity(runtime, FINISHED_CAPACITY)
    }

    pub fn with_finished_capacity(runtime: Arc<ProductionRuntime>, capacity: usize) -> Self {
        Self {
            runtime,
            sessions: RwLock::new(HashMap::new()),
            finished: RwLock::new(FinishedSessions::new(capacity)),
        }
    }

    pub fn runtime(&self) -> &ProductionRuntime {
        &self.runtime
    }

    /// Create an interview and run its greeting turn
    pub async fn start(&self) -> (String, TurnOutcome) {
        let id = uuid::Uuid::new_v4().to_string();
        let handle: SessionHandle = Arc::new(Mutex::new(Session::new(id.clone())));

        // Hold the session lock while it becomes visible, so nobody can
        // slip a message in ahead of the greeting.
        let mut session = handle.lock().await;
        let live = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.clone(), handle.clone());
            sessions.len()
        };
        tracing::info!(
            session_id = %id,
            model = %self.runtime.model_id(),
            live,
            "Interview started"
        );

        let outcome = self.runtime.handle_utterance(&mut session, "").await;
        (id, outcome)
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Run one candidate turn; `None` if the interview is unknown or has ended
    pub async fn send(&self, id: &str, text: &str) -> Option<(TurnOutcome, Session)> {
        let handle = self.get(id).await?;
        let mut session = handle.lock().await;
        // Lost the race with the turn that ended it
        if session.stage == Stage::Ending {
            return None;
        }

        let outcome = self.runtime.handle_utterance(&mut session, text).await;
        if session.stage == Stage::Ending {
            self.finish(&session).await;
        }
        Some((outcome, session.clone()))
    }

    /// Copy of the interview as it stands, live or recently ended
    pub async fn session(&self, id: &str) -> Option<Session> {
        if let Some(handle) = self.get(id).await {
            let session = handle.lock().await;
            return Some(session.clone());
        }
        self.finished.read().await.get(id).cloned()
    }

    /// Number of live interviews
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Move an ended interview out of the live map; caller holds its lock
    async fn finish(&self, session: &Session) {
        self.finished.write().await.insert(session.clone());
        self.sessions.write().await.remove(&session.id);
        let live = self.count().await;
        tracing::info!(session_id = %session.id, live, "Interview finished");
    }
}

/// Ended interviews in insertion order
struct FinishedSessions {
    capacity: usize,
    order: VecDeque<String>,
    sessions: HashMap<String, Session>,
}

impl FinishedSessions {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            sessions: HashMap::new(),
        }
    }

    fn insert(&mut self, session: Session) {
        let id = session.id.clone();
        if self.sessions.insert(id.clone(), session).is_none() {
            self.order.push_back(id);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.sessions.remove(&oldest);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }
}
