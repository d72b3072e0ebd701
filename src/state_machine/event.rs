//! Events that can occur during an interview

use super::state::Mark;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// One raw candidate utterance. Empty text is the opening turn.
    Utterance { text: String },

    /// Question list produced by the question-generation collaborator
    QuestionsGenerated {
        tech: String,
        questions: Vec<String>,
    },

    /// Grade produced by the language model for a recorded answer
    MarkAssigned {
        tech: String,
        answer_index: usize,
        mark: Mark,
    },
}

impl Event {
    pub fn utterance(text: impl Into<String>) -> Self {
        Event::Utterance { text: text.into() }
    }
}
