//! Prompt construction for the interviewer, question generator and grader
//!
//! The interviewer prompt re-serializes the whole session every turn so the
//! model can phrase the next stage-appropriate question without keeping any
//! state of its own.

use crate::state_machine::state::{InfoField, Session, Stage, TechScore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Base system prompt establishing the interviewer's role
const BASE_PROMPT: &str = r#"You are an AI hiring assistant for TalentScout, a technology recruitment agency. Your role is to:
1. Greet candidates professionally
2. Collect essential information (name, email, phone, experience, desired position, location)
3. Gather their tech stack details
4. Ask technical questions about each technology in their tech stack
5. Maintain conversation context
6. End the conversation gracefully when appropriate

Guidelines:
- Be professional and friendly
- Ask one question at a time
- End the conversation when the candidate says goodbye, exit, or similar
- Keep responses concise and focused

Technical Question Rules:
1. Questions are asked one at a time, in the order listed in the state below
2. For each question:
   - Full correct answer = 1 mark
   - Partial correct answer = 0.5 marks
   - Incorrect or "I don't know" = 0 marks
3. If a candidate doesn't know an answer, give the correct answer, explain the concept briefly, then move to the next question
4. Scores are tracked for you in the state below; never invent or change them
5. At the end, provide a summary of scores by technology"#;

const QUESTION_PROMPT: &str = "Write between 3 and 5 technical interview questions to assess a candidate's proficiency in";

const GRADING_PROMPT: &str = r#"You are grading one answer from a technical interview.
Award 1 mark for a fully correct answer, 0.5 for a partially correct answer, and 0 for an incorrect answer or "I don't know".
Reply with a single line of the form `MARK: <1|0.5|0>` followed by one sentence of justification."#;

/// The parts of the session the model needs to see each turn
#[derive(Debug, Serialize)]
struct PromptState<'a> {
    stage: Stage,
    collected_info: &'a crate::state_machine::state::CollectedInfo,
    tech_stack: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    current_tech: Option<&'a str>,
    current_question_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_question: Option<&'a str>,
    questions: &'a BTreeMap<String, Vec<String>>,
    scores: &'a BTreeMap<String, TechScore>,
}

impl<'a> PromptState<'a> {
    fn from_session(session: &'a Session) -> Self {
        Self {
            stage: session.stage,
            collected_info: &session.collected_info,
            tech_stack: session.tech_stack(),
            current_tech: session.current_tech_name(),
            current_question_index: session.current_question_index,
            current_question: session.current_question(),
            questions: &session.questions,
            scores: &session.scores,
        }
    }
}

/// Build the interviewer system prompt for the session as it stands after
/// this turn's transition.
pub fn build_system_prompt(session: &Session) -> String {
    let state = serde_json::to_string_pretty(&PromptState::from_session(session))
        .unwrap_or_else(|_| "{}".to_string());

    let mut prompt = String::from(BASE_PROMPT);
    let _ = write!(prompt, "\n\nCurrent conversation state:\n{state}");
    let _ = write!(prompt, "\n\nYour next step: {}", stage_instruction(session));
    prompt
}

/// What the model should do in its reply for the current stage
fn stage_instruction(session: &Session) -> String {
    match session.stage {
        Stage::Greeting | Stage::CollectingInfo => match session.collected_info.next_missing() {
            Some(InfoField::Name) => {
                "Greet the candidate, briefly explain the process, and ask for their full name."
                    .to_string()
            }
            Some(field) => format!(
                "Acknowledge the answer and ask for the candidate's {}.",
                field_prompt(field)
            ),
            None => "Ask the candidate to list their tech stack, separated by commas.".to_string(),
        },
        Stage::TechStack => {
            "Ask the candidate to list the technologies they know (languages, frameworks, databases, tools), separated by commas."
                .to_string()
        }
        Stage::TechnicalQuestions => match (
            session.current_tech_name(),
            session.current_question(),
        ) {
            (Some(tech), Some(question)) => format!(
                "Briefly respond to the candidate's previous answer if there was one (explain the correct answer if they did not know it), then ask technical question {} about {tech}, exactly: \"{question}\"",
                session.current_question_index + 1
            ),
            (Some(tech), None) => format!("Ask the candidate a technical question about {tech}."),
            _ => "Thank the candidate; there are no technical questions to ask.".to_string(),
        },
        Stage::Summary => format!(
            "Respond to the last answer, then present this score summary and thank the candidate:\n{}",
            crate::quiz::render_summary(session)
        ),
        Stage::Ending => {
            "Thank the candidate for their time, say the recruiting team will be in touch, and say goodbye."
                .to_string()
        }
    }
}

fn field_prompt(field: InfoField) -> &'static str {
    match field {
        InfoField::Name => "full name",
        InfoField::Email => "email address",
        InfoField::Phone => "phone number",
        InfoField::Experience => "years of experience",
        InfoField::Position => "desired position(s)",
        InfoField::Location => "current location",
    }
}

/// Prompt asking the question generator for one technology's questions
pub fn question_generation_prompt(session: &Session, tech: &str) -> String {
    let mut prompt = format!("{QUESTION_PROMPT} {tech}.");
    if let Some(experience) = session.collected_info.experience.as_deref() {
        let _ = write!(prompt, " The candidate reports {experience} of experience.");
    }
    if let Some(position) = session.collected_info.position.as_deref() {
        let _ = write!(prompt, " They are applying for: {position}.");
    }
    prompt.push_str(
        "\nEach question must be answerable in a few sentences in a chat. Output only a numbered list, one question per line, with no other text.",
    );
    prompt
}

/// Prompt asking the grader to mark one answer
pub fn grading_prompt(tech: &str, question: Option<&str>, answer: &str) -> (String, String) {
    let question =
        question.unwrap_or("(the question was not recorded; grade the answer on its own merits)");
    let user = format!("Technology: {tech}\nQuestion: {question}\nCandidate answer: {answer}");
    (GRADING_PROMPT.to_string(), user)
}
