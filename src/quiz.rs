//! Parsing of question lists and marks out of model text, and score summaries

use crate::state_machine::state::{Mark, Session};
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

pub const MIN_QUESTIONS: usize = 3;
pub const MAX_QUESTIONS: usize = 5;

fn list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "1.", "2)", "Q3:", or a "-", "*", "•" bullet followed by a space
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?:[Qq]\s*)?\d+\s*[.):-]|[-*•]\s)\s*").expect("valid regex")
    })
}

fn mark_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)\b(?:mark|score)s?\s*[:=]\s*\**\s*",
            r"(1/2|half|1(?:\.0+)?|0?\.50*|0(?:\.0+)?)\b",
        ))
        .expect("valid regex")
    })
}

/// Pull up to five questions out of a generated list.
///
/// Lines that carry a list marker are preferred; if the model ignored the
/// format, every non-empty line ending in `?` is taken instead.
pub fn parse_questions(text: &str) -> Vec<String> {
    let marked: Vec<String> = text
        .lines()
        .filter_map(marked_question)
        .take(MAX_QUESTIONS)
        .collect();
    if !marked.is_empty() {
        return marked;
    }

    text.lines()
        .map(clean_question)
        .filter(|line| line.ends_with('?'))
        .take(MAX_QUESTIONS)
        .collect()
}

/// A list item with its marker removed; headings like `**Rust:**` are skipped
fn marked_question(line: &str) -> Option<String> {
    let line = unbold(line);
    if !list_marker().is_match(line) {
        return None;
    }
    let question = clean_question(&list_marker().replace(line, ""));
    (!question.is_empty() && !question.ends_with(':')).then_some(question)
}

/// `**1. What is X?**` -> `1. What is X?`
fn unbold(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with("**") {
        line.trim_matches('*').trim()
    } else {
        line
    }
}

fn clean_question(line: &str) -> String {
    line.trim().trim_matches('*').trim().to_string()
}

/// Find the `MARK: x` line in a grader reply
pub fn parse_mark(text: &str) -> Option<Mark> {
    let caps = mark_pattern().captures(text)?;
    let value = caps.get(1)?.as_str().to_lowercase();
    let mark = if value == "half" || value == "1/2" || value.contains(".5") {
        Mark::Partial
    } else if value.starts_with('1') {
        Mark::Correct
    } else {
        Mark::Incorrect
    };
    Some(mark)
}

/// Plain-text score table: one line per technology, then the overall total
pub fn render_summary(session: &Session) -> String {
    let mut out = String::new();
    let mut seen = std::collections::HashSet::new();
    let mut answered_total = 0usize;

    for tech in session.tech_stack() {
        if !seen.insert(tech.as_str()) {
            continue;
        }
        let Some(score) = session.scores.get(tech) else {
            continue;
        };
        let answered = score.questions.len();
        answered_total += answered;
        let _ = writeln!(
            out,
            "- {}: {} / {} ({} graded)",
            display_tech(tech),
            format_marks(score.total),
            answered,
            score.graded_count()
        );
    }
    let _ = write!(
        out,
        "Total: {} / {answered_total}",
        format_marks(session.total_score())
    );
    out
}

fn display_tech(tech: &str) -> &str {
    if tech.is_empty() {
        "(unnamed)"
    } else {
        tech
    }
}

fn format_marks(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
