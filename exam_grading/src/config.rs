// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;
use std::ops::RangeInclusive;

/// The ordinal position of a question in the exam. Starts at 1.
pub type QuestionIndex = u32;

/// One of the valid multiple-choice options, for example `A`.
///
/// The blank state (no answer, or an answer that could not be understood) is
/// not a letter: it is represented by `None` wherever a letter is optional.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct AnswerLetter(char);

impl AnswerLetter {
    pub fn new(c: char) -> AnswerLetter {
        AnswerLetter(c.to_ascii_uppercase())
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl Display for AnswerLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The question columns found in one table: question number -> column label.
///
/// The label is kept exactly as it appears in the table (surrounding
/// whitespace included) so that it can be used for cell lookups.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnMap {
    columns: BTreeMap<QuestionIndex, String>,
}

impl ColumnMap {
    pub fn get(&self, question: QuestionIndex) -> Option<&str> {
        self.columns.get(&question).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The question numbers, in increasing order.
    pub fn questions(&self) -> impl Iterator<Item = QuestionIndex> + '_ {
        self.columns.keys().cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionIndex, &str)> + '_ {
        self.columns.iter().map(|(q, l)| (*q, l.as_str()))
    }

    /// Registers a column, unless the question already has one.
    /// Returns false if the question was already mapped.
    pub(crate) fn insert_first(&mut self, question: QuestionIndex, label: &str) -> bool {
        if self.columns.contains_key(&question) {
            return false;
        }
        self.columns.insert(question, label.to_string());
        true
    }
}

/// The correct answer of every gradable question.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AnswerKey {
    answers: BTreeMap<QuestionIndex, AnswerLetter>,
}

impl AnswerKey {
    pub fn get(&self, question: QuestionIndex) -> Option<AnswerLetter> {
        self.answers.get(&question).cloned()
    }

    pub fn contains(&self, question: QuestionIndex) -> bool {
        self.answers.contains_key(&question)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// The question numbers, in increasing order.
    pub fn questions(&self) -> impl Iterator<Item = QuestionIndex> + '_ {
        self.answers.keys().cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionIndex, AnswerLetter)> + '_ {
        self.answers.iter().map(|(q, a)| (*q, *a))
    }

    /// The largest question number in the key, 0 for an empty key.
    pub fn last_question(&self) -> QuestionIndex {
        self.answers.keys().next_back().cloned().unwrap_or(0)
    }
}

impl FromIterator<(QuestionIndex, AnswerLetter)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (QuestionIndex, AnswerLetter)>>(iter: I) -> Self {
        AnswerKey {
            answers: iter.into_iter().collect(),
        }
    }
}

/// A named subject covering a contiguous range of questions.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Subject {
    pub name: String,
    pub questions: RangeInclusive<QuestionIndex>,
}

impl Subject {
    pub fn new(name: &str, first: QuestionIndex, last: QuestionIndex) -> Subject {
        Subject {
            name: name.to_string(),
            questions: first..=last,
        }
    }

    pub fn contains(&self, question: QuestionIndex) -> bool {
        self.questions.contains(&question)
    }

    pub fn declared_len(&self) -> usize {
        if self.questions.is_empty() {
            return 0;
        }
        (*self.questions.end() - *self.questions.start()) as usize + 1
    }
}

/// The partition of the exam questions into subjects.
/// Subjects are reported in the order in which they are declared.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SubjectMap {
    subjects: Vec<Subject>,
}

impl SubjectMap {
    pub fn new(subjects: Vec<Subject>) -> SubjectMap {
        SubjectMap { subjects }
    }

    /// The layout of the standard 110-question admission exam.
    pub fn default_exam() -> SubjectMap {
        SubjectMap::new(vec![
            Subject::new("Physics", 1, 15),
            Subject::new("History", 16, 30),
            Subject::new("Mathematics", 31, 60),
            Subject::new("Biology", 61, 75),
            Subject::new("Reasoning", 76, 80),
            Subject::new("Chemistry", 81, 90),
            Subject::new("Spanish", 91, 110),
        ])
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Total number of questions declared over all the subjects.
    pub fn declared_total(&self) -> usize {
        self.subjects.iter().map(|s| s.declared_len()).sum()
    }

    /// Compares the declared ranges with the questions actually present in an exam.
    /// Declared questions above `max_question` are not considered.
    pub fn coverage(&self, questions: &[QuestionIndex], max_question: QuestionIndex) -> SubjectCoverage {
        let present: BTreeSet<QuestionIndex> = questions.iter().cloned().collect();
        let mut uncovered: Vec<QuestionIndex> = Vec::new();
        let mut overlapping: Vec<QuestionIndex> = Vec::new();
        for q in present.iter() {
            match self.subjects.iter().filter(|s| s.contains(*q)).count() {
                0 => uncovered.push(*q),
                1 => {}
                _ => overlapping.push(*q),
            }
        }
        let declared: BTreeSet<QuestionIndex> = self
            .subjects
            .iter()
            .flat_map(|s| *s.questions.start()..=(*s.questions.end()).min(max_question))
            .collect();
        let missing: Vec<QuestionIndex> = declared.difference(&present).cloned().collect();
        SubjectCoverage {
            uncovered,
            overlapping,
            missing,
        }
    }
}

/// Mismatches between a subject map and the questions of an exam.
/// None of them prevents grading.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SubjectCoverage {
    /// Questions of the exam that belong to no subject.
    pub uncovered: Vec<QuestionIndex>,
    /// Questions of the exam that belong to more than one subject.
    pub overlapping: Vec<QuestionIndex>,
    /// Declared questions that are not part of the exam.
    pub missing: Vec<QuestionIndex>,
}

impl SubjectCoverage {
    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty() && self.overlapping.is_empty() && self.missing.is_empty()
    }
}

// ********* Configuration **********

/// The largest question number accepted by default.
pub const DEFAULT_MAX_QUESTION: QuestionIndex = 10_000;

/// What to do with an entry of the answer key that is not blank but is not a
/// valid answer either.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum KeyEntryPolicy {
    /// Drop the question from the key and keep going.
    SkipInvalid,
    /// Abort the whole grading run.
    Strict,
}

/// Candidate labels for the identity columns of the responses table.
/// Candidates are tried in order: exact matches first, then substrings.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IdentityColumns {
    pub name: Vec<String>,
    pub email: Vec<String>,
    pub group: Vec<String>,
}

impl Default for IdentityColumns {
    fn default() -> Self {
        IdentityColumns {
            name: to_strings(&["Nombre completo", "Full name", "Nombre"]),
            email: to_strings(&["Nombre de usuario", "Email", "Correo"]),
            group: to_strings(&["Grupo", "Group"]),
        }
    }
}

/// The values used when an identity field cannot be read.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Placeholders {
    /// Followed by the 1-based row number, e.g. `Student 3`.
    pub name_prefix: String,
    pub email: String,
    pub group: String,
    /// The bucket collecting all the students without a usable group.
    pub ungrouped: String,
}

impl Placeholders {
    pub fn student_name(&self, row: usize) -> String {
        format!("{} {}", self.name_prefix, row + 1)
    }
}

impl Default for Placeholders {
    fn default() -> Self {
        Placeholders {
            name_prefix: "Student".to_string(),
            email: "No email".to_string(),
            group: "No group".to_string(),
            ungrouped: "Ungrouped".to_string(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct GradingRules {
    pub valid_answers: Vec<char>,
    /// Column labels containing one of these markers (case-insensitive) are
    /// score or comment columns and never hold answers.
    pub qualifier_markers: Vec<String>,
    pub identity_columns: IdentityColumns,
    pub placeholders: Placeholders,
    /// The numeric score of a perfect exam.
    pub score_scale: f64,
    pub key_policy: KeyEntryPolicy,
    /// Percentage from which a student passes a subject.
    pub passing_percentage: f64,
    /// Columns numbered above this are not question columns.
    pub max_question: QuestionIndex,
}

impl GradingRules {
    pub fn default_rules() -> GradingRules {
        GradingRules {
            valid_answers: vec!['A', 'B', 'C', 'D', 'E'],
            qualifier_markers: to_strings(&[
                "[Score]",
                "[Comments]",
                "[Puntuación]",
                "[Puntuacion]",
                "[Comentarios]",
            ]),
            identity_columns: IdentityColumns::default(),
            placeholders: Placeholders::default(),
            score_scale: 10.0,
            key_policy: KeyEntryPolicy::SkipInvalid,
            passing_percentage: 60.0,
            max_question: DEFAULT_MAX_QUESTION,
        }
    }
}

impl Default for GradingRules {
    fn default() -> Self {
        GradingRules::default_rules()
    }
}

fn to_strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

// ******** Output data structures *********

/// The three disjoint classifications of the questions of an answer key.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QuestionSets {
    pub correct: BTreeSet<QuestionIndex>,
    pub incorrect: BTreeSet<QuestionIndex>,
    pub unanswered: BTreeSet<QuestionIndex>,
}

/// The results of one student for one subject.
#[derive(PartialEq, Debug, Clone)]
pub struct SubjectResult {
    pub subject: String,
    pub correct: Vec<QuestionIndex>,
    pub incorrect: Vec<QuestionIndex>,
    pub unanswered: Vec<QuestionIndex>,
    /// Number of questions of the subject present in the answer key.
    pub total: usize,
    pub percentage: f64,
    pub score: f64,
}

/// The graded exam of one student (one row of the responses).
///
/// The totals are always derived from the question sets.
#[derive(PartialEq, Debug, Clone)]
pub struct StudentRecord {
    /// Position of the row in the responses table, starting at 0.
    pub row: usize,
    pub name: String,
    pub email: String,
    pub group: String,
    pub correct: BTreeSet<QuestionIndex>,
    pub incorrect: BTreeSet<QuestionIndex>,
    pub unanswered: BTreeSet<QuestionIndex>,
    pub subjects: Vec<SubjectResult>,
    pub score_scale: f64,
}

impl StudentRecord {
    pub fn total_correct(&self) -> usize {
        self.correct.len()
    }

    pub fn total_incorrect(&self) -> usize {
        self.incorrect.len()
    }

    pub fn total_unanswered(&self) -> usize {
        self.unanswered.len()
    }

    pub fn total_questions(&self) -> usize {
        self.correct.len() + self.incorrect.len() + self.unanswered.len()
    }

    pub fn percentage(&self) -> f64 {
        percentage_of(self.total_correct(), self.total_questions())
    }

    pub fn score(&self) -> f64 {
        scaled_score(self.total_correct(), self.total_questions(), self.score_scale)
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectResult> {
        self.subjects.iter().find(|s| s.subject == name)
    }

    pub fn question_sets(&self) -> QuestionSets {
        QuestionSets {
            correct: self.correct.clone(),
            incorrect: self.incorrect.clone(),
            unanswered: self.unanswered.clone(),
        }
    }

    /// The flat per-question row for questions `1..=last_question`:
    /// `Some(0)` correct, `Some(1)` incorrect, `None` unanswered or not graded.
    pub fn correctness_row(&self, last_question: QuestionIndex) -> Vec<Option<u8>> {
        (1..=last_question)
            .map(|q| {
                if self.correct.contains(&q) {
                    Some(0)
                } else if self.incorrect.contains(&q) {
                    Some(1)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Rebuilds the question sets from a row produced by `correctness_row`.
    /// Blank cells of questions in the key are unanswered questions.
    pub fn sets_from_correctness_row(row: &[Option<u8>], key: &AnswerKey) -> QuestionSets {
        let mut sets = QuestionSets::default();
        for q in key.questions() {
            let cell = q
                .checked_sub(1)
                .and_then(|idx| row.get(idx as usize))
                .cloned()
                .flatten();
            match cell {
                Some(0) => {
                    sets.correct.insert(q);
                }
                Some(_) => {
                    sets.incorrect.insert(q);
                }
                None => {
                    sets.unanswered.insert(q);
                }
            }
        }
        sets
    }
}

/// Number of students in each score band.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ScoreDistribution {
    /// [90, 100]
    pub excellent: usize,
    /// [80, 90)
    pub very_good: usize,
    /// [70, 80)
    pub good: usize,
    /// [60, 70)
    pub fair: usize,
    /// [0, 60)
    pub needs_improvement: usize,
}

impl ScoreDistribution {
    pub fn record(&mut self, percentage: f64) {
        if percentage >= 90.0 {
            self.excellent += 1;
        } else if percentage >= 80.0 {
            self.very_good += 1;
        } else if percentage >= 70.0 {
            self.good += 1;
        } else if percentage >= 60.0 {
            self.fair += 1;
        } else {
            self.needs_improvement += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.very_good + self.good + self.fair + self.needs_improvement
    }

    /// The bands with their labels, from the top band down.
    pub fn bands(&self) -> [(&'static str, usize); 5] {
        [
            ("Excellent (90-100%)", self.excellent),
            ("Very good (80-89%)", self.very_good),
            ("Good (70-79%)", self.good),
            ("Fair (60-69%)", self.fair),
            ("Needs improvement (<60%)", self.needs_improvement),
        ]
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StudentHighlight {
    pub name: String,
    pub percentage: f64,
    pub correct: usize,
}

/// Statistics of one subject within a group.
#[derive(PartialEq, Debug, Clone)]
pub struct SubjectStats {
    pub subject: String,
    pub total_questions: usize,
    pub mean_percentage: f64,
    pub mean_correct: f64,
    pub max_correct: usize,
    pub min_correct: usize,
    /// Students who answered every question of the subject correctly.
    pub perfect_count: usize,
    /// Students at or above the passing percentage.
    pub passing_count: usize,
}

/// Statistics for one group of students.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupAggregate {
    pub name: String,
    pub members: Vec<StudentRecord>,
    pub total_questions: usize,
    pub mean_percentage: f64,
    pub mean_score: f64,
    pub mean_correct: f64,
    pub max_percentage: f64,
    pub min_percentage: f64,
    pub best: StudentHighlight,
    pub worst: StudentHighlight,
    pub distribution: ScoreDistribution,
    pub subjects: Vec<SubjectStats>,
}

impl GroupAggregate {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectStats> {
        self.subjects.iter().find(|s| s.subject == name)
    }
}

/// How often a question was answered incorrectly.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionDifficulty {
    pub question: QuestionIndex,
    pub misses: usize,
    pub students: usize,
    /// misses / students, between 0 and 1.
    pub error_rate: f64,
}

impl QuestionDifficulty {
    pub fn error_percentage(&self) -> f64 {
        round2(self.error_rate * 100.0)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct CohortReport {
    /// All the students together.
    pub overall: GroupAggregate,
    /// One aggregate per group, sorted by group name.
    pub groups: Vec<GroupAggregate>,
    /// Questions with at least one miss, hardest first.
    pub difficulty: Vec<QuestionDifficulty>,
}

impl CohortReport {
    pub fn group(&self, name: &str) -> Option<&GroupAggregate> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Errors that prevent a grading run from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum GradingErrors {
    /// No column of the table looks like a question.
    NoQuestionColumns,
    /// The answer key table has no data row.
    EmptyKeyTable,
    /// No question of the answer key holds a valid answer.
    EmptyAnswerKey,
    /// Strict key policy: a key entry could not be understood.
    InvalidKeyEntry {
        question: QuestionIndex,
        value: String,
    },
    /// There are no students to aggregate.
    NoStudents,
}

impl Error for GradingErrors {}

impl Display for GradingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradingErrors::NoQuestionColumns => write!(
                f,
                "no question columns found (supported labels: '1.', 'question_1', 'P1')"
            ),
            GradingErrors::EmptyKeyTable => write!(f, "the answer key table is empty"),
            GradingErrors::EmptyAnswerKey => write!(
                f,
                "no valid correct answer in the first row of the answer key"
            ),
            GradingErrors::InvalidKeyEntry { question, value } => write!(
                f,
                "invalid answer key entry for question {}: {:?}",
                question, value
            ),
            GradingErrors::NoStudents => write!(f, "no students to aggregate"),
        }
    }
}

// ********* Arithmetic helpers **********

/// Rounds to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `100 * num / den` rounded to two decimals, 0 when `den` is 0.
pub fn percentage_of(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        round2(num as f64 / den as f64 * 100.0)
    }
}

/// `scale * num / den` rounded to two decimals, 0 when `den` is 0.
pub fn scaled_score(num: usize, den: usize, scale: f64) -> f64 {
    if den == 0 {
        0.0
    } else {
        round2(num as f64 / den as f64 * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bands() {
        let mut d = ScoreDistribution::default();
        for p in [100.0, 90.0, 89.99, 80.0, 79.99, 70.0, 60.0, 59.99, 0.0] {
            d.record(p);
        }
        assert_eq!(d.excellent, 2);
        assert_eq!(d.very_good, 2);
        assert_eq!(d.good, 2);
        assert_eq!(d.fair, 1);
        assert_eq!(d.needs_improvement, 2);
        assert_eq!(d.total(), 9);
    }

    #[test]
    fn coverage_stops_at_the_maximum() {
        let subjects = SubjectMap::new(vec![
            Subject::new("Algebra", 1, 2),
            Subject::new("Everything else", 3, 4_000_000_000),
        ]);
        assert_eq!(subjects.declared_total(), 4_000_000_000);
        let c = subjects.coverage(&[1, 2, 3], 5);
        assert_eq!(c.missing, vec![4, 5]);
        assert!(c.uncovered.is_empty());
    }
}
