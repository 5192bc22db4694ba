use log::{debug, info, warn};
use regex::Regex;

use crate::config::*;

/// Recognizes the labels of question columns.
///
/// The conventions are tried in this order, the first one wins:
/// 1. the bare number, optionally followed by a period: `7`, `7.`
/// 2. the word question (or pregunta) and the number: `question_7`, `Pregunta 7`
/// 3. the letter P and the number: `P7`
///
/// Score and comment columns, question 0 and numbers above the maximum of
/// the rules are rejected.
pub struct QuestionLabelMatcher {
    bare_number: Regex,
    question_word: Regex,
    p_prefix: Regex,
    markers: Vec<String>,
    max_question: QuestionIndex,
}

impl QuestionLabelMatcher {
    pub fn new(rules: &GradingRules) -> QuestionLabelMatcher {
        QuestionLabelMatcher {
            bare_number: Regex::new(r"^(\d+)\.?$").expect("valid regex"),
            question_word: Regex::new(r"(?i)^(?:question|pregunta)[_\s]*(\d+)$")
                .expect("valid regex"),
            p_prefix: Regex::new(r"(?i)^P(\d+)$").expect("valid regex"),
            markers: rules.qualifier_markers.clone(),
            max_question: rules.max_question,
        }
    }

    /// The question number encoded in a column label, if any.
    pub fn question_index(&self, label: &str) -> Option<QuestionIndex> {
        let stripped = label.trim();
        if is_qualified_label(stripped, &self.markers) {
            debug!("question_index: skipping qualified column {:?}", label);
            return None;
        }
        let caps = self
            .bare_number
            .captures(stripped)
            .or_else(|| self.question_word.captures(stripped))
            .or_else(|| self.p_prefix.captures(stripped))?;
        let digits = caps.get(1)?.as_str();
        if digits.trim_start_matches('0').is_empty() {
            debug!("question_index: label {:?}: question 0 is not valid", label);
            return None;
        }
        match digits.parse::<u64>() {
            Ok(q) if q <= self.max_question as u64 => Some(q as QuestionIndex),
            _ => {
                warn!(
                    "question_index: label {:?}: question number above the maximum {}, column ignored",
                    label, self.max_question
                );
                None
            }
        }
    }
}

/// True if the label carries one of the score/comment markers.
pub fn is_qualified_label(label: &str, markers: &[String]) -> bool {
    let lower = label.to_lowercase();
    markers
        .iter()
        .any(|m| !m.is_empty() && lower.contains(&m.to_lowercase()))
}

/// Finds the question columns of a table.
///
/// Labels that match no convention are simply not question columns. If the
/// same question appears twice, the first column is kept.
/// Fails with `NoQuestionColumns` when nothing looks like a question.
pub fn discover_columns(labels: &[String], rules: &GradingRules) -> Result<ColumnMap, GradingErrors> {
    let matcher = QuestionLabelMatcher::new(rules);
    let mut res = ColumnMap::default();
    for label in labels.iter() {
        if let Some(q) = matcher.question_index(label) {
            if !res.insert_first(q, label) {
                warn!(
                    "discover_columns: question {} appears in several columns, ignoring {:?}",
                    q, label
                );
            }
        }
    }

    if res.is_empty() {
        warn!(
            "discover_columns: no question columns among {} columns. First labels: {:?}",
            labels.len(),
            labels.iter().take(20).collect::<Vec<&String>>()
        );
        return Err(GradingErrors::NoQuestionColumns);
    }
    let first = res.questions().next().unwrap_or(0);
    let last = res.questions().last().unwrap_or(0);
    info!(
        "discover_columns: found {} question columns (questions {} to {})",
        res.len(),
        first,
        last
    );
    Ok(res)
}

/// Finds the column holding an identity field (name, email, group).
///
/// All the candidates are first tried as exact labels (as given, then
/// trimmed). If none matches, the first label containing a candidate
/// (case-insensitive) is used, skipping score/comment columns.
pub fn find_identity_column(
    labels: &[String],
    candidates: &[String],
    markers: &[String],
) -> Option<String> {
    for cand in candidates.iter() {
        for c in [cand.as_str(), cand.trim()] {
            if let Some(l) = labels.iter().find(|l| l.as_str() == c) {
                return Some(l.clone());
            }
        }
    }

    for cand in candidates.iter() {
        let cand_lower = cand.trim().to_lowercase();
        if cand_lower.is_empty() {
            continue;
        }
        let found = labels.iter().find(|l| {
            let l_lower = l.trim().to_lowercase();
            l_lower.contains(&cand_lower) && !is_qualified_label(l, markers)
        });
        if let Some(l) = found {
            debug!(
                "find_identity_column: candidate {:?} matched column {:?}",
                cand, l
            );
            return Some(l.clone());
        }
    }
    None
}
