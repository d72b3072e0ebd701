//! Property-based tests for the interview state machine
//!
//! These tests verify key invariants hold across arbitrary utterance
//! sequences.

use super::state::{InfoField, Mark, Session, Stage};
use super::transition::{transition, TransitionResult};
use super::{Effect, Event, InterviewContext, InterviewSnapshot};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn ctx() -> InterviewContext {
    InterviewContext::default()
}

fn step(session: &Session, event: Event) -> TransitionResult {
    transition(session, &ctx(), event)
}

/// Utterances that can never trip the default keyword set
fn arb_plain_utterance() -> impl Strategy<Value = String> {
    "[a-df-z0-9 ,.@]{0,24}".prop_filter("no termination keyword", |s| {
        !InterviewContext::default().keywords.matches(s)
    })
}

fn arb_tech_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Python".to_string()),
        Just("Go".to_string()),
        Just("Rust".to_string()),
        Just("SQL".to_string()),
        "[A-Z][a-z]{1,6}",
    ]
    .prop_filter("no termination keyword", |s| {
        !InterviewContext::default().keywords.matches(s)
    })
}

fn arb_tech_stack() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_tech_name(), 1..5)
}

fn arb_mark() -> impl Strategy<Value = Mark> {
    prop_oneof![Just(Mark::Correct), Just(Mark::Partial), Just(Mark::Incorrect)]
}

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Greeting),
        Just(Stage::CollectingInfo),
        Just(Stage::TechStack),
        Just(Stage::TechnicalQuestions),
        Just(Stage::Summary),
        Just(Stage::Ending),
    ]
}

/// Session at the start of the quiz with `counts[i]` questions for tech i
fn quiz_session(techs: &[String], counts: &[usize]) -> Session {
    let mut session = Session::new("prop");
    session.stage = Stage::TechStack;
    start_quiz(session, techs, counts)
}

/// Answer the tech-stack prompt and feed generated questions
fn start_quiz(mut session: Session, techs: &[String], counts: &[usize]) -> Session {
    session = step(&session, Event::utterance(techs.join(", "))).new_session;
    for (tech, count) in techs.iter().zip(counts) {
        let questions = (0..*count).map(|i| format!("{tech} #{i}")).collect();
        session = step(
            &session,
            Event::QuestionsGenerated {
                tech: tech.clone(),
                questions,
            },
        )
        .new_session;
    }
    session
}

/// A session driven to an arbitrary point through real transitions
fn arb_session() -> impl Strategy<Value = Session> {
    (
        arb_tech_stack(),
        proptest::collection::vec(1usize..5, 5),
        0usize..30,
    )
        .prop_map(|(techs, counts, answers)| {
            let mut session = Session::new("prop");
            for text in ["", "Ada", "a@b.c", "555", "3y", "Dev", "Oslo"] {
                session = step(&session, Event::utterance(text)).new_session;
            }
            session = start_quiz(session, &techs, &counts);
            for i in 0..answers {
                session = step(&session, Event::utterance(format!("answer {i}"))).new_session;
            }
            session
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Six utterances in collecting_info fill the six profile fields in order
    #[test]
    fn prop_profile_fields_fill_in_order(
        utterances in proptest::collection::vec(arb_plain_utterance(), 6)
    ) {
        let mut session = Session::new("prop");
        session.stage = Stage::CollectingInfo;
        for (i, text) in utterances.iter().enumerate() {
            session = step(&session, Event::utterance(text.clone())).new_session;
            for (j, field) in InfoField::ORDER.iter().enumerate() {
                if j <= i {
                    prop_assert_eq!(
                        session.collected_info.get(*field),
                        Some(utterances[j].as_str())
                    );
                } else {
                    prop_assert_eq!(session.collected_info.get(*field), None);
                }
            }
        }
        prop_assert_eq!(session.stage, Stage::TechStack);
    }

    /// scores and questions are keyed by exactly the tech stack
    #[test]
    fn prop_tech_stack_keys_match(techs in arb_tech_stack()) {
        let session = quiz_session(&techs, &[]);
        let expected: BTreeSet<&str> = techs.iter().map(String::as_str).collect();
        let score_keys: BTreeSet<&str> = session.scores.keys().map(String::as_str).collect();
        let question_keys: BTreeSet<&str> = session.questions.keys().map(String::as_str).collect();
        prop_assert_eq!(&score_keys, &expected);
        prop_assert_eq!(&question_keys, &expected);
        prop_assert_eq!(session.tech_stack(), techs.as_slice());
        prop_assert_eq!(session.current_tech, Some(0));
    }

    /// The pointer always names a tech in the stack while quizzing and stays in range
    #[test]
    fn prop_pointer_stays_in_bounds(
        techs in arb_tech_stack(),
        counts in proptest::collection::vec(1usize..5, 5),
        answers in proptest::collection::vec(arb_plain_utterance(), 0..40),
    ) {
        let mut session = quiz_session(&techs, &counts);
        let total_questions: usize = techs
            .iter()
            .map(|t| session.questions[t].len())
            .sum();

        for (turn, answer) in answers.into_iter().enumerate() {
            session = step(&session, Event::utterance(answer)).new_session;
            match session.stage {
                Stage::TechnicalQuestions => {
                    let tech = session.current_tech_name();
                    prop_assert!(tech.is_some());
                    let len = session.questions[tech.unwrap()].len();
                    prop_assert!(session.current_question_index < len);
                }
                Stage::Summary => {
                    prop_assert_eq!(session.current_tech, None);
                    prop_assert!(turn + 1 >= total_questions);
                }
                other => prop_assert!(false, "unexpected stage {other}"),
            }
        }
    }

    /// One answer per turn, appended to the tech that was current when it was given
    #[test]
    fn prop_answers_recorded_in_asked_order(
        techs in arb_tech_stack(),
        counts in proptest::collection::vec(1usize..4, 5),
        n in 0usize..20,
    ) {
        let mut session = quiz_session(&techs, &counts);
        let mut expected: Vec<(String, String, Option<String>)> = Vec::new();
        for i in 0..n {
            if session.stage != Stage::TechnicalQuestions {
                break;
            }
            let tech = session.current_tech_name().unwrap().to_string();
            let question = session.current_question().map(str::to_string);
            let answer = format!("answer {i}");
            expected.push((tech, answer.clone(), question));
            session = step(&session, Event::utterance(answer)).new_session;
        }

        for tech in session.scores.keys() {
            let recorded: Vec<(String, Option<String>)> = session.scores[tech]
                .questions
                .iter()
                .map(|a| (a.answer.clone(), a.question.clone()))
                .collect();
            let wanted: Vec<(String, Option<String>)> = expected
                .iter()
                .filter(|(t, _, _)| t == tech)
                .map(|(_, a, q)| (a.clone(), q.clone()))
                .collect();
            prop_assert_eq!(recorded, wanted);
        }
    }

    /// Summary is sticky for non-keyword input
    #[test]
    fn prop_summary_is_sticky(
        techs in arb_tech_stack(),
        later in proptest::collection::vec(arb_plain_utterance(), 1..10),
    ) {
        let counts = vec![1; techs.len()];
        let mut session = quiz_session(&techs, &counts);
        for _ in &techs {
            session = step(&session, Event::utterance("answer")).new_session;
        }
        prop_assert_eq!(session.stage, Stage::Summary);
        for text in later {
            let result = step(&session, Event::utterance(text));
            prop_assert_eq!(result.new_session.stage, Stage::Summary);
            prop_assert!(result.effects.is_empty());
            session = result.new_session;
        }
    }

    /// "bye" anywhere, in any case, ends the interview and persists exactly once
    #[test]
    fn prop_bye_ends_from_any_stage(
        session in arb_session(),
        stage in arb_stage(),
        prefix in "[a-z ]{0,8}",
        upper in any::<bool>(),
        later in proptest::collection::vec(arb_plain_utterance(), 0..5),
    ) {
        let mut session = session;
        let was_ending = stage == Stage::Ending;
        session.stage = stage;
        let bye = if upper { "BYE" } else { "bye" };
        let result = step(&session, Event::utterance(format!("{prefix}{bye} now")));

        prop_assert_eq!(result.new_session.stage, Stage::Ending);
        let persists = result.effects.iter().filter(|e| **e == Effect::PersistSnapshot).count();
        prop_assert_eq!(persists, usize::from(!was_ending));
        prop_assert_eq!(result.effects.len(), persists);

        let mut session = result.new_session;
        for text in later {
            let result = step(&session, Event::utterance(text));
            prop_assert_eq!(result.new_session.stage, Stage::Ending);
            prop_assert!(result.effects.is_empty());
            session = result.new_session;
        }
    }

    /// Totals survive a snapshot round trip and equal the sum of recorded marks
    #[test]
    fn prop_snapshot_totals_match_marks(
        techs in arb_tech_stack(),
        counts in proptest::collection::vec(1usize..4, 5),
        marks in proptest::collection::vec(arb_mark(), 0..16),
    ) {
        let mut session = quiz_session(&techs, &counts);
        for mark in marks {
            if session.stage != Stage::TechnicalQuestions {
                break;
            }
            let result = step(&session, Event::utterance("answer"));
            session = result.new_session;
            for effect in result.effects {
                if let Effect::GradeAnswer { tech, answer_index } = effect {
                    let event = Event::MarkAssigned { tech, answer_index, mark };
                    session = step(&session, event).new_session;
                }
            }
        }

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        let restored: InterviewSnapshot = serde_json::from_str(&json).unwrap();
        let manual: f64 = restored
            .scores
            .values()
            .flat_map(|s| s.questions.iter())
            .filter_map(|a| a.mark)
            .map(Mark::value)
            .sum();
        prop_assert!((restored.total_score() - manual).abs() < 1e-9);
        for score in restored.scores.values() {
            prop_assert!((score.total - score.marks_sum()).abs() < 1e-9);
        }
    }

    /// Malformed quiz pointers never panic and never change the stage
    #[test]
    fn prop_dangling_pointer_is_noop(
        pointer in proptest::option::of(0usize..8),
        index in 0usize..8,
        techs in proptest::collection::vec(arb_tech_name(), 0..3),
        answer in arb_plain_utterance(),
    ) {
        let mut session = Session::new("prop");
        session.stage = Stage::TechnicalQuestions;
        session.collected_info.tech_stack = Some(techs);
        session.current_tech = pointer;
        session.current_question_index = index;
        // No score entries at all: every pointer is dangling
        let result = step(&session, Event::utterance(answer));
        prop_assert_eq!(&result.new_session, &session);
        prop_assert!(result.effects.is_empty());
    }

    /// Degenerate tech stack input advances without a crash
    #[test]
    fn prop_degenerate_tech_stack_input(text in "[ ,]{0,6}") {
        let mut session = Session::new("prop");
        session.stage = Stage::TechStack;
        let result = step(&session, Event::utterance(text));
        prop_assert_eq!(result.new_session.stage, Stage::TechnicalQuestions);
        prop_assert!(result.new_session.tech_stack().iter().all(String::is_empty));
    }
}

#[test]
fn test_empty_tech_stack_does_not_set_current_tech() {
    // Splitting never yields zero pieces, so build the degenerate session by hand
    let mut session = Session::new("s");
    session.stage = Stage::TechnicalQuestions;
    session.collected_info.tech_stack = Some(Vec::new());
    let result = step(&session, Event::utterance("Go"));
    assert_eq!(result.new_session.stage, Stage::TechnicalQuestions);
    assert_eq!(result.new_session.current_tech, None);
}
