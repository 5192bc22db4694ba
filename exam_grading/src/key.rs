use log::{debug, info, warn};

use crate::answers::{clean_answer_text, normalize_answer};
use crate::columns::discover_columns;
use crate::config::*;
use crate::table::{is_missing_marker, Table};

/// Reads the correct answers from the first data row of the key table.
///
/// Only the questions of `target` (the question columns of the responses)
/// are looked up. Questions missing from the key table, or whose key value is
/// blank, are left out of the key. Invalid key values are left out too, or
/// abort the run under the strict key policy.
pub fn extract_answer_key(
    key_table: &dyn Table,
    target: &ColumnMap,
    rules: &GradingRules,
) -> Result<AnswerKey, GradingErrors> {
    if key_table.row_count() == 0 {
        warn!("extract_answer_key: the key table has no data row");
        return Err(GradingErrors::EmptyKeyTable);
    }
    if key_table.row_count() > 1 {
        warn!(
            "extract_answer_key: the key table has {} rows, only the first one is used",
            key_table.row_count()
        );
    }

    // No question column in the key table leaves the key empty.
    let key_columns = discover_columns(key_table.labels(), rules)
        .unwrap_or_default();

    let mut answers: Vec<(QuestionIndex, AnswerLetter)> = Vec::new();
    for q in target.questions() {
        let label = match key_columns.get(q) {
            Some(l) => l,
            None => {
                debug!("extract_answer_key: question {} is not in the key table", q);
                continue;
            }
        };
        let cell = key_table.cell(0, label);
        match normalize_answer(&cell, &rules.valid_answers) {
            Some(letter) => {
                debug!("extract_answer_key: question {:3}: {}", q, letter);
                answers.push((q, letter));
            }
            None => match invalid_text(&cell) {
                Some(text) if rules.key_policy == KeyEntryPolicy::Strict => {
                    return Err(GradingErrors::InvalidKeyEntry {
                        question: q,
                        value: text,
                    });
                }
                Some(text) => {
                    warn!(
                        "extract_answer_key: question {}: invalid key value {:?}, question ignored",
                        q, text
                    );
                }
                None => {
                    debug!("extract_answer_key: question {}: blank key value", q);
                }
            },
        }
    }

    let key: AnswerKey = answers.into_iter().collect();
    if key.is_empty() {
        warn!("extract_answer_key: no valid correct answer in the first row of the key table");
        return Err(GradingErrors::EmptyAnswerKey);
    }
    info!(
        "extract_answer_key: loaded {} correct answers out of {} questions",
        key.len(),
        target.len()
    );
    Ok(key)
}

// The cleaned text of a cell that is neither blank nor a valid answer.
fn invalid_text(cell: &crate::table::Cell) -> Option<String> {
    clean_answer_text(cell).filter(|s| !is_missing_marker(s))
}

/// The state of the entries of an answer key table.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct KeyDiagnostics {
    /// The question columns of the key table.
    pub columns: ColumnMap,
    pub valid: Vec<(QuestionIndex, AnswerLetter)>,
    pub blank: Vec<QuestionIndex>,
    /// Entries that could not be understood, with their cleaned text.
    pub invalid: Vec<(QuestionIndex, String)>,
}

/// How healthy an answer key looks.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum KeyHealth {
    /// No valid entry at all: grading is impossible.
    Critical,
    /// Less than 80% of the question columns hold a valid entry.
    Incomplete,
    Ok,
}

impl KeyDiagnostics {
    pub fn health(&self) -> KeyHealth {
        let num_columns = self.columns.len();
        if self.valid.is_empty() {
            KeyHealth::Critical
        } else if (self.valid.len() as f64) < (num_columns as f64) * 0.8 {
            KeyHealth::Incomplete
        } else {
            KeyHealth::Ok
        }
    }
}

/// Inspects every question column of the key table, without grading.
pub fn diagnose_key(
    key_table: &dyn Table,
    rules: &GradingRules,
) -> Result<KeyDiagnostics, GradingErrors> {
    let columns = discover_columns(key_table.labels(), rules)?;
    if key_table.row_count() == 0 {
        return Err(GradingErrors::EmptyKeyTable);
    }
    let mut res = KeyDiagnostics {
        columns: columns.clone(),
        ..Default::default()
    };
    for (q, label) in columns.iter() {
        let cell = key_table.cell(0, label);
        if let Some(letter) = normalize_answer(&cell, &rules.valid_answers) {
            res.valid.push((q, letter));
        } else if let Some(text) = invalid_text(&cell) {
            res.invalid.push((q, text));
        } else {
            res.blank.push(q);
        }
    }
    Ok(res)
}
