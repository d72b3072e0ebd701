//! Interview session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ============================================================================
// Stage
// ============================================================================

/// Phase of the interview script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    CollectingInfo,
    TechStack,
    TechnicalQuestions,
    Summary,
    /// Absorbing state, reachable from every other stage
    Ending,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::CollectingInfo => "collecting_info",
            Stage::TechStack => "tech_stack",
            Stage::TechnicalQuestions => "technical_questions",
            Stage::Summary => "summary",
            Stage::Ending => "ending",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Candidate profile
// ============================================================================

/// Profile fields, in the order they are asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoField {
    Name,
    Email,
    Phone,
    Experience,
    Position,
    Location,
}

impl InfoField {
    pub const ORDER: [InfoField; 6] = [
        InfoField::Name,
        InfoField::Email,
        InfoField::Phone,
        InfoField::Experience,
        InfoField::Position,
        InfoField::Location,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InfoField::Name => "name",
            InfoField::Email => "email",
            InfoField::Phone => "phone",
            InfoField::Experience => "experience",
            InfoField::Position => "position",
            InfoField::Location => "location",
        }
    }
}

/// Everything the candidate has told us about themselves.
///
/// Fields serialize in collection order and are omitted until filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
}

impl CollectedInfo {
    pub fn get(&self, field: InfoField) -> Option<&str> {
        match field {
            InfoField::Name => self.name.as_deref(),
            InfoField::Email => self.email.as_deref(),
            InfoField::Phone => self.phone.as_deref(),
            InfoField::Experience => self.experience.as_deref(),
            InfoField::Position => self.position.as_deref(),
            InfoField::Location => self.location.as_deref(),
        }
    }

    pub fn set(&mut self, field: InfoField, value: String) {
        let slot = match field {
            InfoField::Name => &mut self.name,
            InfoField::Email => &mut self.email,
            InfoField::Phone => &mut self.phone,
            InfoField::Experience => &mut self.experience,
            InfoField::Position => &mut self.position,
            InfoField::Location => &mut self.location,
        };
        *slot = Some(value);
    }

    /// First profile field that has not been answered yet
    pub fn next_missing(&self) -> Option<InfoField> {
        InfoField::ORDER
            .into_iter()
            .find(|field| self.get(*field).is_none())
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Credit given for one answered question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    /// Fully correct: 1 mark
    Correct,
    /// Partially correct: 0.5 marks
    Partial,
    /// Incorrect or "I don't know": 0 marks
    Incorrect,
}

impl Mark {
    pub fn value(self) -> f64 {
        match self {
            Mark::Correct => 1.0,
            Mark::Partial => 0.5,
            Mark::Incorrect => 0.0,
        }
    }
}

/// One answer as it was given, with its mark once grading comes back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    #[serde(default)]
    pub question: Option<String>,
    pub answer: String,
    #[serde(default)]
    pub mark: Option<Mark>,
}

/// Running score for one technology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechScore {
    pub total: f64,
    #[serde(default)]
    pub questions: Vec<RecordedAnswer>,
}

impl TechScore {
    pub fn graded_count(&self) -> usize {
        self.questions.iter().filter(|a| a.mark.is_some()).count()
    }

    /// Sum of the recorded marks, independent of `total`
    #[allow(dead_code)] // Used in tests
    pub fn marks_sum(&self) -> f64 {
        self.questions
            .iter()
            .filter_map(|a| a.mark)
            .map(Mark::value)
            .sum()
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One chat turn as shown to the candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    #[serde(rename = "content")]
    pub text: String,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// The whole interview instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub collected_info: CollectedInfo,
    #[serde(default)]
    pub scores: BTreeMap<String, TechScore>,
    #[serde(default)]
    pub questions: BTreeMap<String, Vec<String>>,
    /// Position into `tech_stack` of the technology being quizzed
    #[serde(default)]
    pub current_tech: Option<usize>,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            stage: Stage::Greeting,
            collected_info: CollectedInfo::default(),
            scores: BTreeMap::new(),
            questions: BTreeMap::new(),
            current_tech: None,
            current_question_index: 0,
            transcript: Vec::new(),
        }
    }

    pub fn tech_stack(&self) -> &[String] {
        self.collected_info.tech_stack.as_deref().unwrap_or(&[])
    }

    /// Name of the technology being quizzed, if the pointer is valid
    pub fn current_tech_name(&self) -> Option<&str> {
        self.current_tech
            .and_then(|pos| self.tech_stack().get(pos))
            .map(String::as_str)
    }

    /// Text of the question the candidate is expected to answer next
    pub fn current_question(&self) -> Option<&str> {
        let tech = self.current_tech_name()?;
        self.questions
            .get(tech)?
            .get(self.current_question_index)
            .map(String::as_str)
    }

    /// Technologies that still need a question list, in the order the
    /// candidate named them
    pub fn techs_without_questions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tech_stack()
            .iter()
            .filter(|tech| seen.insert(tech.as_str()))
            .filter(|tech| self.questions.get(*tech).is_some_and(Vec::is_empty))
            .cloned()
            .collect()
    }

    pub fn total_score(&self) -> f64 {
        self.scores.values().map(|s| s.total).sum()
    }

    /// The last `n` transcript entries, oldest first
    pub fn recent_transcript(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.transcript.len().saturating_sub(n);
        &self.transcript[start..]
    }

    pub fn snapshot(&self) -> InterviewSnapshot {
        InterviewSnapshot {
            session_id: self.id.clone(),
            started_at: self.created_at,
            stage: self.stage,
            timestamp: chrono::Local::now().format(SNAPSHOT_TIMESTAMP_FORMAT).to_string(),
            candidate_info: self.collected_info.clone(),
            tech_stack: self.tech_stack().to_vec(),
            scores: self.scores.clone(),
            transcript: self.transcript.clone(),
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What gets handed to storage when an interview finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stage: Stage,
    /// Local wall-clock time the snapshot was taken
    pub timestamp: String,
    pub candidate_info: CollectedInfo,
    pub tech_stack: Vec<String>,
    pub scores: BTreeMap<String, TechScore>,
    #[serde(rename = "conversation_summary")]
    pub transcript: Vec<TranscriptEntry>,
}

impl InterviewSnapshot {
    pub fn total_score(&self) -> f64 {
        self.tech_stack_scores().map(|s| s.total).sum()
    }

    /// Score entries in tech-stack order, each technology counted once
    pub fn tech_stack_scores(&self) -> impl Iterator<Item = &TechScore> {
        let mut seen = HashSet::new();
        self.tech_stack
            .iter()
            .filter(move |tech| seen.insert(tech.as_str()))
            .filter_map(|tech| self.scores.get(tech))
    }
}

/// Context for an interview (configuration that does not change per turn)
#[derive(Debug, Clone)]
pub struct InterviewContext {
    pub keywords: TerminationKeywords,
}

impl InterviewContext {
    pub fn new(keywords: TerminationKeywords) -> Self {
        Self { keywords }
    }
}

impl Default for InterviewContext {
    fn default() -> Self {
        Self::new(TerminationKeywords::default())
    }
}

/// Words that end the interview wherever they appear in an utterance.
///
/// Matching is a plain lowercase substring test, so "bye" also matches
/// "maybe". Keep it that way unless the keyword list changes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationKeywords(Vec<String>);

pub const DEFAULT_TERMINATION_KEYWORDS: &[&str] = &["goodbye", "bye", "exit", "quit"];

impl TerminationKeywords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list, e.g. from an env var
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn matches(&self, utterance: &str) -> bool {
        let lowered = utterance.to_lowercase();
        self.0.iter().any(|word| lowered.contains(word.as_str()))
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }
}

impl Default for TerminationKeywords {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATION_KEYWORDS)
    }
}
