//! Effects produced by state transitions

/// Effects to be executed by the runtime after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the question-generation collaborator for these technologies
    GenerateQuestions { techs: Vec<String> },

    /// Ask the language model to grade a pending answer
    GradeAnswer { tech: String, answer_index: usize },

    /// Hand a snapshot of the session to storage
    PersistSnapshot,
}

impl Effect {
    pub fn grade_answer(tech: impl Into<String>, answer_index: usize) -> Self {
        Effect::GradeAnswer {
            tech: tech.into(),
            answer_index,
        }
    }
}
