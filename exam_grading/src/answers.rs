use crate::config::AnswerLetter;
use crate::table::Cell;

// Punctuation that spreadsheet exports tend to append to answers ("A.", "B;").
const STRAY_PUNCTUATION: [char; 3] = ['.', ',', ';'];

/// The cleaned-up text of an answer cell: trimmed, uppercased and without
/// stray punctuation. `None` if the cell is missing or nothing is left.
pub fn clean_answer_text(cell: &Cell) -> Option<String> {
    let raw = match cell {
        Cell::Missing => return None,
        Cell::Float(f) if f.is_nan() => return None,
        c => c.to_text()?,
    };
    let cleaned: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !STRAY_PUNCTUATION.contains(c))
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Turns a raw cell into one of the valid letters, or `None` (blank).
///
/// Anything that is not exactly one valid letter after cleaning is blank,
/// including the stringified missing markers (`NAN`, `NONE`).
pub fn normalize_answer(cell: &Cell, valid_answers: &[char]) -> Option<AnswerLetter> {
    let cleaned = clean_answer_text(cell)?;
    let mut chars = cleaned.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if valid_answers.iter().any(|v| v.to_ascii_uppercase() == c) => {
            Some(AnswerLetter::new(c))
        }
        _ => None,
    }
}
