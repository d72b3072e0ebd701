//! Pure state transition function
//!
//! Given the same session, context and event this always produces the same
//! result. No I/O happens here; anything that needs a collaborator is
//! returned as an [`Effect`] for the runtime to carry out.

use super::state::{InfoField, InterviewContext, RecordedAnswer, Session, Stage, TechScore};
use super::{Effect, Event};

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Pure transition function.
///
/// Malformed sessions (dangling `current_tech`, missing score entries) are
/// treated as no-ops rather than errors.
pub fn transition(
    session: &Session,
    context: &InterviewContext,
    event: Event,
) -> TransitionResult {
    match event {
        Event::Utterance { text } => on_utterance(session, context, text),
        Event::QuestionsGenerated { tech, questions } => {
            on_questions_generated(session, &tech, questions)
        }
        Event::MarkAssigned {
            tech,
            answer_index,
            mark,
        } => {
            let mut next = session.clone();
            let recorded = next.scores.get_mut(&tech).is_some_and(|score| {
                match score.questions.get_mut(answer_index) {
                    Some(answer) if answer.mark.is_none() => {
                        answer.mark = Some(mark);
                        score.total += mark.value();
                        true
                    }
                    _ => false,
                }
            });
            if !recorded {
                tracing::debug!(%tech, answer_index, "Ignoring mark for unknown or graded answer");
            }
            TransitionResult::new(next)
        }
    }
}

fn on_utterance(session: &Session, context: &InterviewContext, text: String) -> TransitionResult {
    let mut next = session.clone();

    // Termination pre-empts everything else, including mid-quiz
    if context.keywords.matches(&text) {
        if next.stage == Stage::Ending {
            return TransitionResult::new(next);
        }
        next.stage = Stage::Ending;
        return TransitionResult::new(next).with_effect(Effect::PersistSnapshot);
    }

    match session.stage {
        Stage::Greeting => {
            next.stage = Stage::CollectingInfo;
            TransitionResult::new(next)
        }

        Stage::CollectingInfo => {
            if let Some(field) = next.collected_info.next_missing() {
                next.collected_info.set(field, text);
                if field == InfoField::Location {
                    next.stage = Stage::TechStack;
                }
            } else {
                // Profile complete but stage never moved on; repair it
                next.stage = Stage::TechStack;
            }
            TransitionResult::new(next)
        }

        Stage::TechStack => {
            if next.collected_info.tech_stack.is_some() {
                return TransitionResult::new(next);
            }
            let techs = split_tech_stack(&text);
            for tech in &techs {
                next.scores.insert(tech.clone(), TechScore::default());
                next.questions.insert(tech.clone(), Vec::new());
            }
            next.collected_info.tech_stack = Some(techs);
            next.stage = Stage::TechnicalQuestions;

            if next.tech_stack().is_empty() {
                return TransitionResult::new(next);
            }
            next.current_tech = Some(0);
            next.current_question_index = 0;
            let techs = next.techs_without_questions();
            TransitionResult::new(next).with_effect(Effect::GenerateQuestions { techs })
        }

        Stage::TechnicalQuestions => on_answer(next, text),

        Stage::Summary | Stage::Ending => TransitionResult::new(next),
    }
}

/// Record the answer to the current question and move the pointer on
fn on_answer(mut next: Session, answer: String) -> TransitionResult {
    let Some(pos) = next.current_tech else {
        return TransitionResult::new(next);
    };
    let Some(tech) = next.tech_stack().get(pos).cloned() else {
        return TransitionResult::new(next);
    };
    if !next.scores.contains_key(&tech) {
        return TransitionResult::new(next);
    }

    let question = next.current_question().map(str::to_string);
    let mut effects = Vec::new();
    if let Some(score) = next.scores.get_mut(&tech) {
        score.questions.push(RecordedAnswer {
            question,
            answer,
            mark: None,
        });
        effects.push(Effect::grade_answer(&tech, score.questions.len() - 1));
    }

    next.current_question_index += 1;
    let asked = next.questions.get(&tech).map_or(0, Vec::len);
    if next.current_question_index >= asked {
        if pos + 1 < next.tech_stack().len() {
            next.current_tech = Some(pos + 1);
            next.current_question_index = 0;
        } else {
            next.current_tech = None;
            next.stage = Stage::Summary;
            effects.push(Effect::PersistSnapshot);
        }
    }

    TransitionResult::new(next).with_effects(effects)
}

fn on_questions_generated(
    session: &Session,
    tech: &str,
    questions: Vec<String>,
) -> TransitionResult {
    let mut next = session.clone();
    match next.questions.get_mut(tech) {
        Some(slot) if slot.is_empty() => *slot = questions,
        _ => tracing::debug!(%tech, "Ignoring questions for unknown or already populated tech"),
    }
    TransitionResult::new(next)
}

/// Split a comma-delimited tech stack, trimming each piece. Empty pieces
/// and duplicates are kept as given.
pub fn split_tech_stack(text: &str) -> Vec<String> {
    text.split(',').map(|piece| piece.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::state::{CollectedInfo, Mark, TerminationKeywords};

    fn ctx() -> InterviewContext {
        InterviewContext::default()
    }

    fn step(session: &Session, text: &str) -> TransitionResult {
        transition(session, &ctx(), Event::utterance(text))
    }

    fn feed(mut session: Session, texts: &[&str]) -> Session {
        for text in texts {
            session = step(&session, text).new_session;
        }
        session
    }

    /// Session positioned at the start of the quiz with the given question counts
    fn quiz_session(techs: &[(&str, usize)]) -> Session {
        let mut session = Session::new("quiz");
        session.stage = Stage::TechStack;
        let stack = techs.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(", ");
        session = step(&session, &stack).new_session;
        for (tech, count) in techs {
            let questions = (0..*count).map(|i| format!("{tech} q{i}")).collect();
            session = transition(
                &session,
                &ctx(),
                Event::QuestionsGenerated {
                    tech: (*tech).to_string(),
                    questions,
                },
            )
            .new_session;
        }
        session
    }

    #[test]
    fn test_greeting_advances_without_capturing() {
        let session = Session::new("s");
        let result = step(&session, "");
        assert_eq!(result.new_session.stage, Stage::CollectingInfo);
        assert_eq!(result.new_session.collected_info, CollectedInfo::default());
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_collecting_info_fills_fields_in_order() {
        let session = feed(Session::new("s"), &[""]);
        let session = feed(
            session,
            &["Ada", "ada@example.com", "555-0100", "5 years", "Backend", "Lisbon"],
        );
        let info = &session.collected_info;
        assert_eq!(info.name.as_deref(), Some("Ada"));
        assert_eq!(info.email.as_deref(), Some("ada@example.com"));
        assert_eq!(info.phone.as_deref(), Some("555-0100"));
        assert_eq!(info.experience.as_deref(), Some("5 years"));
        assert_eq!(info.position.as_deref(), Some("Backend"));
        assert_eq!(info.location.as_deref(), Some("Lisbon"));
        assert_eq!(session.stage, Stage::TechStack);
        assert!(info.tech_stack.is_none());
    }

    #[test]
    fn test_collecting_info_stores_raw_utterance() {
        let session = feed(Session::new("s"), &["", "  Ada  "]);
        assert_eq!(session.collected_info.name.as_deref(), Some("  Ada  "));
        assert_eq!(session.stage, Stage::CollectingInfo);
    }

    #[test]
    fn test_tech_stack_split_and_trim() {
        let mut session = Session::new("s");
        session.stage = Stage::TechStack;
        let result = step(&session, "Python, Go , Rust");
        let next = result.new_session;
        assert_eq!(next.tech_stack(), ["Python", "Go", "Rust"]);
        assert_eq!(
            next.scores.keys().collect::<Vec<_>>(),
            vec!["Go", "Python", "Rust"]
        );
        assert_eq!(
            next.questions.keys().collect::<Vec<_>>(),
            vec!["Go", "Python", "Rust"]
        );
        assert!(next
            .scores
            .values()
            .all(|s| s.total.abs() < f64::EPSILON && s.questions.is_empty()));
        assert_eq!(next.stage, Stage::TechnicalQuestions);
        assert_eq!(next.current_tech_name(), Some("Python"));
        assert_eq!(next.current_question_index, 0);
        assert_eq!(
            result.effects,
            vec![Effect::GenerateQuestions {
                techs: vec!["Python".into(), "Go".into(), "Rust".into()]
            }]
        );
    }

    #[test]
    fn test_tech_stack_keeps_empty_and_duplicate_pieces() {
        let mut session = Session::new("s");
        session.stage = Stage::TechStack;
        let next = step(&session, "Go,,Go").new_session;
        assert_eq!(next.tech_stack(), ["Go", "", "Go"]);
        assert_eq!(next.scores.len(), 2);
    }

    #[test]
    fn test_tech_stack_set_only_once() {
        let mut session = Session::new("s");
        session.stage = Stage::TechStack;
        session.collected_info.tech_stack = Some(vec!["Go".into()]);
        let next = step(&session, "Rust").new_session;
        assert_eq!(next.tech_stack(), ["Go"]);
        assert_eq!(next.stage, Stage::TechStack);
    }

    #[test]
    fn test_answers_walk_questions_then_next_tech() {
        let mut session = quiz_session(&[("Python", 3), ("Go", 2)]);
        assert_eq!(session.current_question(), Some("Python q0"));

        session = step(&session, "answer 0").new_session;
        assert_eq!(session.current_question_index, 1);
        session = step(&session, "answer 1").new_session;
        assert_eq!(session.current_question_index, 2);

        let result = step(&session, "answer 2");
        session = result.new_session;
        assert_eq!(session.current_tech_name(), Some("Go"));
        assert_eq!(session.current_question_index, 0);
        assert_eq!(result.effects, vec![Effect::grade_answer("Python", 2)]);

        let answers = &session.scores["Python"].questions;
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[1].question.as_deref(), Some("Python q1"));
        assert_eq!(answers[1].answer, "answer 1");
        assert!(answers.iter().all(|a| a.mark.is_none()));
    }

    #[test]
    fn test_last_tech_exhausted_moves_to_summary() {
        let mut session = quiz_session(&[("Rust", 1)]);
        let result = step(&session, "ownership");
        session = result.new_session;
        assert_eq!(session.stage, Stage::Summary);
        assert_eq!(session.current_tech, None);
        assert_eq!(
            result.effects,
            vec![Effect::grade_answer("Rust", 0), Effect::PersistSnapshot]
        );

        let result = step(&session, "anything else?");
        assert_eq!(result.new_session.stage, Stage::Summary);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_tech_without_questions_is_skipped_after_one_answer() {
        let session = quiz_session(&[("Go", 0), ("Rust", 2)]);
        let next = step(&session, "no questions were asked").new_session;
        assert_eq!(next.current_tech_name(), Some("Rust"));
        assert_eq!(next.current_question_index, 0);
    }

    #[test]
    fn test_bye_mid_quiz_ends_and_persists_once() {
        let session = quiz_session(&[("Go", 3)]);
        let result = step(&session, "OK BYE");
        assert_eq!(result.new_session.stage, Stage::Ending);
        assert_eq!(result.effects, vec![Effect::PersistSnapshot]);
        // Pointer untouched by the ending turn
        assert_eq!(result.new_session.current_question_index, 0);
        assert!(result.new_session.scores["Go"].questions.is_empty());

        let again = step(&result.new_session, "bye again");
        assert_eq!(again.new_session.stage, Stage::Ending);
        assert!(again.effects.is_empty());

        let reopen = step(&again.new_session, "Actually I have a question");
        assert_eq!(reopen.new_session.stage, Stage::Ending);
    }

    #[test]
    fn test_custom_keyword_set() {
        let context = InterviewContext::new(TerminationKeywords::parse("thank you"));
        let mut session = Session::new("s");
        session.stage = Stage::CollectingInfo;
        let result = transition(&session, &context, Event::utterance("goodbye"));
        assert_eq!(result.new_session.stage, Stage::CollectingInfo);
        let result = transition(&session, &context, Event::utterance("Thank you!"));
        assert_eq!(result.new_session.stage, Stage::Ending);
    }

    #[test]
    fn test_missing_current_tech_is_noop() {
        let mut session = Session::new("s");
        session.stage = Stage::TechnicalQuestions;
        session.collected_info.tech_stack = Some(vec![]);
        let result = step(&session, "answer");
        assert_eq!(result.new_session, session);
        assert!(result.effects.is_empty());

        session.collected_info.tech_stack = Some(vec!["Go".into()]);
        session.current_tech = Some(0);
        // "Go" has no score entry
        let result = step(&session, "answer");
        assert_eq!(result.new_session, session);

        session.current_tech = Some(7);
        let result = step(&session, "answer");
        assert_eq!(result.new_session, session);
    }

    #[test]
    fn test_questions_generated_only_fills_empty_known_slots() {
        let session = quiz_session(&[("Go", 2)]);
        let next = transition(
            &session,
            &ctx(),
            Event::QuestionsGenerated {
                tech: "Go".into(),
                questions: vec!["other".into()],
            },
        )
        .new_session;
        assert_eq!(next.questions["Go"], vec!["Go q0", "Go q1"]);

        let next = transition(
            &next,
            &ctx(),
            Event::QuestionsGenerated {
                tech: "Cobol".into(),
                questions: vec!["q".into()],
            },
        )
        .new_session;
        assert!(!next.questions.contains_key("Cobol"));
    }

    #[test]
    fn test_marks_recorded_once_in_order() {
        let mut session = quiz_session(&[("Go", 3)]);
        session = feed(session, &["a0", "a1"]);

        let mark = |s: &Session, idx: usize, mark: Mark| {
            transition(
                s,
                &ctx(),
                Event::MarkAssigned {
                    tech: "Go".into(),
                    answer_index: idx,
                    mark,
                },
            )
            .new_session
        };
        session = mark(&session, 1, Mark::Partial);
        session = mark(&session, 0, Mark::Correct);
        // Second grade for the same answer is ignored
        session = mark(&session, 0, Mark::Incorrect);
        // No answer at index 2 yet
        session = mark(&session, 2, Mark::Correct);

        let score = &session.scores["Go"];
        assert!((score.total - 1.5).abs() < f64::EPSILON);
        assert_eq!(score.questions[0].mark, Some(Mark::Correct));
        assert_eq!(score.questions[1].mark, Some(Mark::Partial));
        assert_eq!(score.questions.len(), 2);
        assert!((score.marks_sum() - score.total).abs() < f64::EPSILON);
    }

    #[test]
    fn test_split_tech_stack() {
        assert_eq!(split_tech_stack(" a ,b,, c "), vec!["a", "b", "", "c"]);
        assert_eq!(split_tech_stack(""), vec![""]);
    }
}
