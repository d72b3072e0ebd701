//! Interview turn executor
//!
//! A turn is: pure transition, then the effects it asked for (question
//! generation, grading, persistence), then the interviewer reply. Any
//! collaborator failure puts the session back the way it was before the
//! turn and the candidate gets [`FALLBACK_REPLY`].

use super::traits::{LlmClient, SnapshotStore};
use crate::llm::{LlmError, LlmMessage, LlmRequest};
use crate::quiz::{parse_mark, parse_questions, MIN_QUESTIONS};
use crate::state_machine::state::{Mark, Session, Stage, TranscriptEntry};
use crate::state_machine::{transition, Effect, Event, InterviewContext};
use crate::store::StoreError;
use crate::system_prompt::{build_system_prompt, grading_prompt, question_generation_prompt};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

/// What the candidate sees when a turn fails
pub const FALLBACK_REPLY: &str =
    "I apologize, but I encountered an error processing your response. Please try again.";

/// Upper bound on question generation and grading calls
pub const AUXILIARY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Saving the interview failed: {0}")]
    Store(#[from] StoreError),
    #[error("No questions could be parsed for {tech}")]
    NoQuestions { tech: String },
    #[error("{0} timed out")]
    Timeout(&'static str),
}

/// Per-turn model parameters
#[derive(Debug, Clone, Copy)]
pub struct TurnSettings {
    pub history_window: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            history_window: crate::config::DEFAULT_HISTORY_WINDOW,
            temperature: crate::config::DEFAULT_TEMPERATURE,
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Result of one candidate turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub stage: Stage,
    /// The turn was rolled back and `reply` is the fallback apology
    pub failed: bool,
}

/// Runs turns against any LLM client and snapshot store
pub struct InterviewRuntime<L, S>
where
    L: LlmClient,
    S: SnapshotStore,
{
    context: InterviewContext,
    settings: TurnSettings,
    llm: L,
    store: S,
}

impl<L, S> InterviewRuntime<L, S>
where
    L: LlmClient,
    S: SnapshotStore,
{
    pub fn new(context: InterviewContext, settings: TurnSettings, llm: L, store: S) -> Self {
        Self {
            context,
            settings,
            llm,
            store,
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Handle one utterance. Never fails: errors roll the session back.
    pub async fn handle_utterance(&self, session: &mut Session, text: &str) -> TurnOutcome {
        let before = session.clone();
        match self.run_turn(session, text).await {
            Ok(reply) => TurnOutcome {
                reply,
                stage: session.stage,
                failed: false,
            },
            Err(e) => {
                tracing::error!(
                    session_id = %before.id,
                    stage = %before.stage,
                    error = %e,
                    "Turn failed, rolling back"
                );
                *session = before;
                TurnOutcome {
                    reply: FALLBACK_REPLY.to_string(),
                    stage: session.stage,
                    failed: true,
                }
            }
        }
    }

    async fn run_turn(&self, session: &mut Session, text: &str) -> Result<String, TurnError> {
        let from = session.stage;
        let result = transition(session, &self.context, Event::utterance(text));
        *session = result.new_session;
        if session.stage != from {
            tracing::info!(
                session_id = %session.id,
                from = %from,
                to = %session.stage,
                "Stage changed"
            );
        }

        let mut persist = false;
        let mut pending: VecDeque<Effect> = result.effects.into();
        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::GenerateQuestions { techs } => {
                    for tech in techs {
                        let questions = self.generate_questions(session, &tech).await?;
                        let event = Event::QuestionsGenerated { tech, questions };
                        self.apply(session, event, &mut pending);
                    }
                }
                Effect::GradeAnswer { tech, answer_index } => {
                    if let Some(mark) = self.grade_answer(session, &tech, answer_index).await? {
                        self.apply(
                            session,
                            Event::MarkAssigned {
                                tech,
                                answer_index,
                                mark,
                            },
                            &mut pending,
                        );
                    }
                }
                Effect::PersistSnapshot => persist = true,
            }
        }

        let request = self.interviewer_request(session, text);
        if !text.is_empty() {
            session.transcript.push(TranscriptEntry::user(text));
        }
        let mut reply = self.llm.complete(&request).await?.text;
        session.transcript.push(TranscriptEntry::assistant(reply.clone()));

        if persist {
            let location = self.store.save(&session.snapshot()).await?;
            reply = format!(
                "{reply}\n\nThank you for your time! Your interview data has been saved to {location}"
            );
            if let Some(last) = session.transcript.last_mut() {
                last.text.clone_from(&reply);
            }
        }

        Ok(reply)
    }

    /// Feed a collaborator result back through the state machine
    fn apply(&self, session: &mut Session, event: Event, pending: &mut VecDeque<Effect>) {
        let result = transition(session, &self.context, event);
        *session = result.new_session;
        pending.extend(result.effects);
    }

    /// System prompt, recent history, then the new utterance
    fn interviewer_request(&self, session: &Session, text: &str) -> LlmRequest {
        let mut messages: Vec<LlmMessage> = session
            .recent_transcript(self.settings.history_window)
            .iter()
            .map(LlmMessage::from)
            .collect();
        if !text.is_empty() {
            messages.push(LlmMessage::user(text));
        }
        LlmRequest {
            system: Some(build_system_prompt(session)),
            messages,
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        }
    }

    async fn generate_questions(
        &self,
        session: &Session,
        tech: &str,
    ) -> Result<Vec<String>, TurnError> {
        let request = LlmRequest {
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
            ..LlmRequest::single(question_generation_prompt(session, tech))
        };
        let response = tokio::time::timeout(AUXILIARY_TIMEOUT, self.llm.complete(&request))
            .await
            .map_err(|_| TurnError::Timeout("Question generation"))??;

        let questions = parse_questions(&response.text);
        if questions.is_empty() {
            return Err(TurnError::NoQuestions {
                tech: tech.to_string(),
            });
        }
        if questions.len() < MIN_QUESTIONS {
            tracing::warn!(tech = %tech, count = questions.len(), "Fewer questions than requested");
        }
        tracing::info!(
            session_id = %session.id,
            tech = %tech,
            count = questions.len(),
            "Generated questions"
        );
        Ok(questions)
    }

    /// `None` when the grader reply carries no recognizable mark
    async fn grade_answer(
        &self,
        session: &Session,
        tech: &str,
        answer_index: usize,
    ) -> Result<Option<Mark>, TurnError> {
        let Some(answer) = session
            .scores
            .get(tech)
            .and_then(|score| score.questions.get(answer_index))
        else {
            tracing::debug!(tech = %tech, answer_index, "Nothing to grade");
            return Ok(None);
        };

        let (system, user) = grading_prompt(tech, answer.question.as_deref(), &answer.answer);
        let request = LlmRequest {
            system: Some(system),
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(0.0),
            ..LlmRequest::single(user)
        };
        let response = tokio::time::timeout(AUXILIARY_TIMEOUT, self.llm.complete(&request))
            .await
            .map_err(|_| TurnError::Timeout("Grading"))??;

        let mark = parse_mark(&response.text);
        match mark {
            Some(mark) => {
                tracing::info!(
                    session_id = %session.id,
                    tech = %tech,
                    answer_index,
                    ?mark,
                    "Graded answer"
                );
            }
            None => {
                tracing::warn!(
                    session_id = %session.id,
                    tech = %tech,
                    answer_index,
                    "Grader reply had no mark"
                );
            }
        }
        Ok(mark)
    }
}
