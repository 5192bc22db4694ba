mod config;
pub mod answers;
pub mod builder;
pub mod cohort;
pub mod columns;
pub mod key;
pub mod manual;
pub mod table;

use log::{debug, info, warn};

use std::collections::BTreeSet;

pub use crate::config::*;
pub use crate::table::{Cell, MemoryTable, Table};

use crate::answers::{clean_answer_text, normalize_answer};
use crate::cohort::canonical_group;
use crate::columns::{discover_columns, find_identity_column};
use crate::key::extract_answer_key;
use crate::table::is_missing_marker;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Classification {
    Correct,
    Incorrect,
    Unanswered,
}

// The columns holding the identity of the students, when found.
#[derive(Eq, PartialEq, Debug, Clone)]
struct IdentityLocation {
    name: Option<String>,
    email: Option<String>,
    group: Option<String>,
}

/// The outcome of a complete grading run.
#[derive(PartialEq, Debug, Clone)]
pub struct ExamResults {
    pub answer_key: AnswerKey,
    /// The question columns of the responses table.
    pub columns: ColumnMap,
    /// One record per response row, in the order of the rows.
    pub records: Vec<StudentRecord>,
}

/// Grades a whole exam: finds the question columns of the responses, reads
/// the answer key, and grades every response row.
///
/// Arguments:
/// * `key_table` the table holding the correct answers in its first data row
/// * `responses` the table with one row per student
/// * `subjects` the partition of the questions into subjects
/// * `rules` the grading policies
pub fn grade_exam(
    key_table: &dyn Table,
    responses: &dyn Table,
    subjects: &SubjectMap,
    rules: &GradingRules,
) -> Result<ExamResults, GradingErrors> {
    let columns = discover_columns(responses.labels(), rules)?;
    let answer_key = extract_answer_key(key_table, &columns, rules)?;
    let records = grade_responses(&answer_key, subjects, responses, rules)?;
    Ok(ExamResults {
        answer_key,
        columns,
        records,
    })
}

/// Grades every row of the responses table against the answer key.
///
/// Each row produces exactly one record, however incomplete it is. The run
/// is aborted before any record is produced if the responses have no
/// question column or if the key is empty.
pub fn grade_responses(
    key: &AnswerKey,
    subjects: &SubjectMap,
    responses: &dyn Table,
    rules: &GradingRules,
) -> Result<Vec<StudentRecord>, GradingErrors> {
    let columns = discover_columns(responses.labels(), rules)?;
    if key.is_empty() {
        return Err(GradingErrors::EmptyAnswerKey);
    }
    info!(
        "grade_responses: grading {} rows on {} questions",
        responses.row_count(),
        key.len()
    );

    check_coverage(subjects, key, rules.max_question);
    let identity = locate_identity(responses.labels(), rules);

    let mut res: Vec<StudentRecord> = Vec::with_capacity(responses.row_count());
    for row in 0..responses.row_count() {
        let record = grade_row(row, key, subjects, responses, &columns, &identity, rules);
        debug!(
            "grade_responses: row {}: {} -> {}/{} ({}%)",
            row,
            record.name,
            record.total_correct(),
            record.total_questions(),
            record.percentage()
        );
        res.push(record);
    }
    info!("grade_responses: graded {} students", res.len());
    Ok(res)
}

fn check_coverage(subjects: &SubjectMap, key: &AnswerKey, max_question: QuestionIndex) {
    let questions: Vec<QuestionIndex> = key.questions().collect();
    let coverage = subjects.coverage(&questions, max_question);
    if coverage.is_complete() {
        return;
    }
    if !coverage.uncovered.is_empty() {
        warn!(
            "check_coverage: questions not assigned to any subject: {:?}",
            coverage.uncovered
        );
    }
    if !coverage.overlapping.is_empty() {
        warn!(
            "check_coverage: questions assigned to several subjects: {:?}",
            coverage.overlapping
        );
    }
    if !coverage.missing.is_empty() {
        info!(
            "check_coverage: {} declared questions are not part of this exam",
            coverage.missing.len()
        );
    }
}

fn locate_identity(labels: &[String], rules: &GradingRules) -> IdentityLocation {
    let markers = &rules.qualifier_markers;
    let cols = &rules.identity_columns;
    let res = IdentityLocation {
        name: find_identity_column(labels, &cols.name, markers),
        email: find_identity_column(labels, &cols.email, markers),
        group: find_identity_column(labels, &cols.group, markers),
    };
    for (field, col) in [
        ("name", &res.name),
        ("email", &res.email),
        ("group", &res.group),
    ] {
        match col {
            Some(c) => debug!("locate_identity: {} column: {:?}", field, c),
            None => warn!(
                "locate_identity: no {} column found, using placeholder values",
                field
            ),
        }
    }
    res
}

fn identity_value(
    responses: &dyn Table,
    row: usize,
    column: &Option<String>,
    default: String,
) -> String {
    column
        .as_ref()
        .and_then(|c| responses.cell(row, c).to_clean_text())
        .unwrap_or(default)
}

fn classify(cell: &Cell, expected: AnswerLetter, valid_answers: &[char]) -> Classification {
    match normalize_answer(cell, valid_answers) {
        Some(a) if a == expected => Classification::Correct,
        Some(_) => Classification::Incorrect,
        // A mark that is not one of the letters is still a wrong answer.
        None => match clean_answer_text(cell) {
            Some(text) if !is_missing_marker(&text) => Classification::Incorrect,
            _ => Classification::Unanswered,
        },
    }
}

fn grade_row(
    row: usize,
    key: &AnswerKey,
    subjects: &SubjectMap,
    responses: &dyn Table,
    columns: &ColumnMap,
    identity: &IdentityLocation,
    rules: &GradingRules,
) -> StudentRecord {
    let ph = &rules.placeholders;
    let name = identity_value(responses, row, &identity.name, ph.student_name(row));
    let email = identity_value(responses, row, &identity.email, ph.email.clone());
    let group = identity_value(responses, row, &identity.group, ph.group.clone());

    let mut sets = QuestionSets::default();
    for (q, expected) in key.iter() {
        let cell = match columns.get(q) {
            Some(label) => responses.cell(row, label),
            None => {
                debug!("grade_row: question {} has no column in the responses", q);
                Cell::Missing
            }
        };
        match classify(&cell, expected, &rules.valid_answers) {
            Classification::Correct => sets.correct.insert(q),
            Classification::Incorrect => sets.incorrect.insert(q),
            Classification::Unanswered => sets.unanswered.insert(q),
        };
    }

    let subject_results: Vec<SubjectResult> = subjects
        .subjects()
        .iter()
        .map(|s| subject_result(s, key, &sets, rules.score_scale))
        .collect();

    StudentRecord {
        row,
        name,
        email,
        group,
        correct: sets.correct,
        incorrect: sets.incorrect,
        unanswered: sets.unanswered,
        subjects: subject_results,
        score_scale: rules.score_scale,
    }
}

fn subject_result(
    subject: &Subject,
    key: &AnswerKey,
    sets: &QuestionSets,
    score_scale: f64,
) -> SubjectResult {
    let domain: BTreeSet<QuestionIndex> = key.questions().filter(|q| subject.contains(*q)).collect();
    let restrict = |s: &BTreeSet<QuestionIndex>| -> Vec<QuestionIndex> {
        s.intersection(&domain).cloned().collect()
    };
    let correct = restrict(&sets.correct);
    let total = domain.len();
    SubjectResult {
        subject: subject.name.clone(),
        percentage: percentage_of(correct.len(), total),
        score: scaled_score(correct.len(), total, score_scale),
        incorrect: restrict(&sets.incorrect),
        unanswered: restrict(&sets.unanswered),
        correct,
        total,
    }
}

// ******** Responses diagnostics ********

const SAMPLE_ROWS: usize = 3;
const SAMPLE_ANSWERS: usize = 5;

/// One response row, as the grader reads it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseSample {
    pub row: usize,
    pub name: String,
    pub email: String,
    pub group: String,
    /// The group used for the statistics.
    pub cohort: String,
    /// The first question columns with the trimmed text of the cell, `None`
    /// when the cell is blank.
    pub answers: Vec<(QuestionIndex, Option<String>)>,
}

/// What the grader finds in a responses table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponsesDiagnostics {
    pub num_rows: usize,
    pub num_columns: usize,
    pub name_column: Option<String>,
    pub email_column: Option<String>,
    pub group_column: Option<String>,
    /// Empty when no column looks like a question.
    pub columns: ColumnMap,
    /// The first rows of the table.
    pub samples: Vec<ResponseSample>,
}

/// Inspects the responses table without grading it: the identity columns,
/// the question columns and the first few students.
pub fn diagnose_responses(responses: &dyn Table, rules: &GradingRules) -> ResponsesDiagnostics {
    let labels = responses.labels();
    let columns = discover_columns(labels, rules).unwrap_or_default();
    let identity = locate_identity(labels, rules);
    let ph = &rules.placeholders;

    let samples: Vec<ResponseSample> = (0..responses.row_count().min(SAMPLE_ROWS))
        .map(|row| {
            let group = identity_value(responses, row, &identity.group, ph.group.clone());
            ResponseSample {
                row,
                name: identity_value(responses, row, &identity.name, ph.student_name(row)),
                email: identity_value(responses, row, &identity.email, ph.email.clone()),
                cohort: canonical_group(&group, ph),
                group,
                answers: columns
                    .iter()
                    .take(SAMPLE_ANSWERS)
                    .map(|(q, label)| (q, responses.cell(row, label).to_clean_text()))
                    .collect(),
            }
        })
        .collect();

    ResponsesDiagnostics {
        num_rows: responses.row_count(),
        num_columns: labels.len(),
        name_column: identity.name,
        email_column: identity.email,
        group_column: identity.group,
        columns,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;
    use crate::cohort::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn table(labels: &[&str], rows: &[&[&str]]) -> MemoryTable {
        let mut b = TableBuilder::new(labels);
        for r in rows {
            b.add_text_row(r);
        }
        b.build()
    }

    fn set(xs: &[QuestionIndex]) -> BTreeSet<QuestionIndex> {
        xs.iter().cloned().collect()
    }

    fn two_subjects() -> SubjectMap {
        SubjectMap::new(vec![Subject::new("S1", 1, 2), Subject::new("S2", 3, 5)])
    }

    fn check_invariants(r: &StudentRecord, key: &AnswerKey) {
        assert!(r.correct.is_disjoint(&r.incorrect));
        assert!(r.correct.is_disjoint(&r.unanswered));
        assert!(r.incorrect.is_disjoint(&r.unanswered));
        assert_eq!(r.total_questions(), key.len());
        let all: BTreeSet<QuestionIndex> = r
            .correct
            .union(&r.incorrect)
            .cloned()
            .collect::<BTreeSet<_>>()
            .union(&r.unanswered)
            .cloned()
            .collect();
        assert_eq!(all, key.questions().collect::<BTreeSet<_>>());
        for s in r.subjects.iter() {
            assert_eq!(
                s.correct.len() + s.incorrect.len() + s.unanswered.len(),
                s.total
            );
        }
    }

    #[test]
    fn end_to_end() {
        init();
        let key_t = table(&["1.", "2.", "3.", "4.", "5."], &[&["A", "B", "C", "D", "E"]]);
        let responses = table(
            &["Nombre completo", "Grupo", "1.", "2.", "3.", "4.", "5."],
            &[&["Ana", "X", "A", "B", "C", "X", ""]],
        );
        let res = grade_exam(&key_t, &responses, &two_subjects(), &GradingRules::default_rules())
            .unwrap();
        assert_eq!(res.records.len(), 1);
        let r = &res.records[0];
        check_invariants(r, &res.answer_key);
        assert_eq!(r.name, "Ana");
        assert_eq!(r.group, "X");
        assert_eq!(r.correct, set(&[1, 2, 3]));
        assert_eq!(r.incorrect, set(&[4]));
        assert_eq!(r.unanswered, set(&[5]));
        assert_eq!(r.percentage(), 60.0);
        assert_eq!(r.score(), 6.0);
        let s1 = r.subject("S1").unwrap();
        assert_eq!(s1.percentage, 100.0);
        assert_eq!(s1.total, 2);
        let s2 = r.subject("S2").unwrap();
        assert_eq!(s2.percentage, 33.33);
        assert_eq!(s2.score, 3.33);
        assert_eq!(s2.correct, vec![3]);
        assert_eq!(s2.incorrect, vec![4]);
        assert_eq!(s2.unanswered, vec![5]);
    }

    #[test]
    fn missing_identity_gets_placeholders() {
        init();
        let key_t = table(&["P1", "P2"], &[&["A", "B"]]);
        let responses = table(
            &["Email", "P1", "P2"],
            &[&["a@x.org", "A", "A"], &["nan", "", ""]],
        );
        let rules = GradingRules::default_rules();
        let res = grade_exam(&key_t, &responses, &SubjectMap::default(), &rules).unwrap();
        assert_eq!(res.records.len(), 2);
        assert_eq!(res.records[0].name, "Student 1");
        assert_eq!(res.records[0].email, "a@x.org");
        assert_eq!(res.records[0].group, "No group");
        assert_eq!(res.records[1].name, "Student 2");
        assert_eq!(res.records[1].email, "No email");
        assert_eq!(res.records[1].unanswered, set(&[1, 2]));
        assert_eq!(res.records[1].percentage(), 0.0);
    }

    #[test]
    fn subjects_use_the_key_domain() {
        init();
        // Question 3 is missing from the key, question 9 belongs to no subject.
        let key_t = table(&["1.", "2.", "3.", "9."], &[&["A", "B", "", "C"]]);
        let responses = table(&["1.", "2.", "3.", "9."], &[&["A", "C", "A", "C"]]);
        let subjects = SubjectMap::new(vec![Subject::new("S1", 1, 3), Subject::new("S2", 4, 6)]);
        let res = grade_exam(&key_t, &responses, &subjects, &GradingRules::default_rules()).unwrap();
        let r = &res.records[0];
        check_invariants(r, &res.answer_key);
        assert_eq!(res.answer_key.len(), 3);
        let s1 = r.subject("S1").unwrap();
        assert_eq!(s1.total, 2);
        assert_eq!(s1.percentage, 50.0);
        let s2 = r.subject("S2").unwrap();
        assert_eq!(s2.total, 0);
        assert_eq!(s2.percentage, 0.0);
        assert_eq!(s2.score, 0.0);
        assert_eq!(r.correct, set(&[1, 9]));
    }

    #[test]
    fn fatal_preconditions() {
        init();
        let rules = GradingRules::default_rules();
        let key_t = table(&["1."], &[&["A"]]);
        let no_questions = table(&["Name", "Email"], &[&["Ana", "a@x.org"]]);
        assert_eq!(
            grade_exam(&key_t, &no_questions, &SubjectMap::default(), &rules),
            Err(GradingErrors::NoQuestionColumns)
        );
        let responses = table(&["1."], &[&["A"]]);
        assert_eq!(
            grade_exam(&table(&["1."], &[]), &responses, &SubjectMap::default(), &rules),
            Err(GradingErrors::EmptyKeyTable)
        );
        assert_eq!(
            grade_exam(&table(&["1."], &[&["?"]]), &responses, &SubjectMap::default(), &rules),
            Err(GradingErrors::EmptyAnswerKey)
        );
        assert_eq!(
            grade_responses(&AnswerKey::default(), &SubjectMap::default(), &responses, &rules),
            Err(GradingErrors::EmptyAnswerKey)
        );
    }

    #[test]
    fn no_students_is_not_an_error() {
        init();
        let key_t = table(&["1."], &[&["A"]]);
        let responses = table(&["1."], &[]);
        let rules = GradingRules::default_rules();
        let res = grade_exam(&key_t, &responses, &SubjectMap::default(), &rules).unwrap();
        assert!(res.records.is_empty());
        assert_eq!(
            aggregate_cohorts(&res.records, &rules),
            Err(GradingErrors::NoStudents)
        );
        assert!(question_difficulty(&res.records).is_empty());
    }

    #[test]
    fn groups_and_ungrouped_bucket() {
        init();
        let key_t = table(&["1.", "2."], &[&["A", "B"]]);
        let responses = table(
            &["Nombre", "Grupo", "1.", "2."],
            &[
                &["a", "X", "A", "B"],
                &["b", "nan", "A", ""],
                &["c", "X", "C", "B"],
                &["d", "", "C", "C"],
                &["e", "X", "A", "C"],
                &["f", "None", "A", "B"],
            ],
        );
        let rules = GradingRules::default_rules();
        let res = grade_exam(&key_t, &responses, &SubjectMap::default(), &rules).unwrap();
        let report = aggregate_cohorts(&res.records, &rules).unwrap();
        assert_eq!(report.groups.len(), 2);
        let x = report.group("X").unwrap();
        assert_eq!(x.size(), 3);
        let ungrouped = report.group("Ungrouped").unwrap();
        assert_eq!(ungrouped.size(), 3);
        assert_eq!(report.overall.size(), 6);

        // X: 100%, 50%, 50%
        assert_eq!(x.mean_percentage, 66.67);
        assert_eq!(x.best.name, "a");
        // Ties: the first student encountered.
        assert_eq!(x.worst.name, "c");
        assert_eq!(x.distribution.excellent, 1);
        assert_eq!(x.distribution.needs_improvement, 2);
        assert_eq!(x.distribution.total(), 3);
    }

    #[test]
    fn three_plus_two_students() {
        init();
        let key_t = table(&["1."], &[&["A"]]);
        let responses = table(
            &["Group", "1."],
            &[&["X"], &[""], &["X"], &["nan"], &["X"]],
        );
        let rules = GradingRules::default_rules();
        let res = grade_exam(&key_t, &responses, &SubjectMap::default(), &rules).unwrap();
        let report = aggregate_cohorts(&res.records, &rules).unwrap();
        let sizes: Vec<(String, usize)> = report
            .groups
            .iter()
            .map(|g| (g.name.clone(), g.size()))
            .collect();
        assert_eq!(
            sizes,
            vec![("Ungrouped".to_string(), 2), ("X".to_string(), 3)]
        );
    }

    #[test]
    fn single_member_group() {
        init();
        let key_t = table(&["1.", "2.", "3.", "4."], &[&["A", "B", "C", "D"]]);
        let responses = table(
            &["Nombre", "Grupo", "1.", "2.", "3.", "4."],
            &[&["solo", "Z", "A", "B", "C", "A"]],
        );
        let rules = GradingRules::default_rules();
        let subjects = SubjectMap::new(vec![Subject::new("S1", 1, 2), Subject::new("S2", 3, 4)]);
        let res = grade_exam(&key_t, &responses, &subjects, &rules).unwrap();
        let report = aggregate_cohorts(&res.records, &rules).unwrap();
        let z = report.group("Z").unwrap();
        assert_eq!(z.mean_percentage, 75.0);
        assert_eq!(z.best, z.worst);
        assert_eq!(z.max_percentage, z.min_percentage);
        assert_eq!(z.distribution.good, 1);
        let s1 = z.subject("S1").unwrap();
        assert_eq!(s1.perfect_count, 1);
        assert_eq!(s1.passing_count, 1);
        let s2 = z.subject("S2").unwrap();
        assert_eq!(s2.mean_percentage, 50.0);
        assert_eq!(s2.mean_correct, 1.0);
        assert_eq!(s2.perfect_count, 0);
        assert_eq!(s2.passing_count, 0);
    }

    #[test]
    fn hardest_questions() {
        init();
        let key_t = table(&["1.", "2.", "3."], &[&["A", "B", "C"]]);
        let responses = table(
            &["1.", "2.", "3."],
            &[&["B", "B", "C"], &["C", "A", "C"], &["A", "B", "C"]],
        );
        let res =
            grade_exam(&key_t, &responses, &SubjectMap::default(), &GradingRules::default_rules())
                .unwrap();
        let ranking = question_difficulty(&res.records);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].question, 1);
        assert_eq!(ranking[0].misses, 2);
        assert!((ranking[0].error_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(ranking[1].question, 2);
        assert!((ranking[1].error_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(ranking[1].error_percentage(), 33.33);
    }

    #[test]
    fn ties_in_difficulty_use_question_order() {
        init();
        let key_t = table(&["1.", "2.", "3."], &[&["A", "B", "C"]]);
        let responses = table(&["1.", "2.", "3."], &[&["A", "A", "A"]]);
        let res =
            grade_exam(&key_t, &responses, &SubjectMap::default(), &GradingRules::default_rules())
                .unwrap();
        let order: Vec<QuestionIndex> = question_difficulty(&res.records)
            .iter()
            .map(|d| d.question)
            .collect();
        assert_eq!(order, vec![2, 3]);
    }

    #[test]
    fn correctness_row_round_trip() {
        init();
        let key_t = table(&["1.", "2.", "4.", "5."], &[&["A", "B", "D", "E"]]);
        let responses = table(&["1.", "2.", "3.", "4.", "5."], &[&["A", "C", "A", "", "E"]]);
        let res =
            grade_exam(&key_t, &responses, &SubjectMap::default(), &GradingRules::default_rules())
                .unwrap();
        let r = &res.records[0];
        let row = r.correctness_row(res.answer_key.last_question());
        assert_eq!(row, vec![Some(0), Some(1), None, None, Some(0)]);
        let sets = StudentRecord::sets_from_correctness_row(&row, &res.answer_key);
        assert_eq!(sets, r.question_sets());
    }

    #[test]
    fn parallel_rows_are_independent() {
        init();
        let key_t = table(&["1.", "2."], &[&["A", "B"]]);
        let rows: [&[&str]; 2] = [&["Ana", "A", "C"], &["Bob", "B", "B"]];
        let rules = GradingRules::default_rules();
        let all = grade_exam(
            &key_t,
            &table(&["Nombre", "1.", "2."], &rows),
            &SubjectMap::default(),
            &rules,
        )
        .unwrap();
        let alone = grade_exam(
            &key_t,
            &table(&["Nombre", "1.", "2."], &rows[1..]),
            &SubjectMap::default(),
            &rules,
        )
        .unwrap();
        let expected = StudentRecord {
            row: 1,
            ..alone.records[0].clone()
        };
        assert_eq!(all.records[1], expected);
    }

    #[test]
    fn coverage_report() {
        let subjects = SubjectMap::new(vec![Subject::new("S1", 1, 3), Subject::new("S2", 3, 4)]);
        let c = subjects.coverage(&[1, 2, 3, 5], DEFAULT_MAX_QUESTION);
        assert_eq!(c.uncovered, vec![5]);
        assert_eq!(c.overlapping, vec![3]);
        assert_eq!(c.missing, vec![4]);
        assert!(!c.is_complete());
        assert_eq!(SubjectMap::default_exam().declared_total(), 110);
        let full: Vec<QuestionIndex> = (1..=110).collect();
        assert!(SubjectMap::default_exam().coverage(&full, DEFAULT_MAX_QUESTION).is_complete());
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(95.0), "Excellent");
        assert_eq!(status_label(90.0), "Excellent");
        assert_eq!(status_label(89.99), "Very good");
        assert_eq!(status_label(60.0), "Fair");
        assert_eq!(status_label(0.0), "Needs improvement");
    }

    #[test]
    fn large_question_labels_are_not_graded() {
        init();
        let rules = GradingRules::default_rules();
        let key_t = table(&["P5000000"], &[&["A"]]);
        let responses = table(&["Nombre", "P5000000"], &[&["Ana", "A"]]);
        assert_eq!(
            grade_exam(&key_t, &responses, &SubjectMap::default(), &rules),
            Err(GradingErrors::NoQuestionColumns)
        );

        let key_t = table(&["P1", "P5000000"], &[&["A", "A"]]);
        let responses = table(&["Nombre", "P1", "P5000000"], &[&["Ana", "A", "A"]]);
        let res = grade_exam(&key_t, &responses, &SubjectMap::default(), &rules).unwrap();
        assert_eq!(res.answer_key.len(), 1);
        assert_eq!(res.answer_key.last_question(), 1);
        assert_eq!(res.records[0].correctness_row(res.answer_key.last_question()).len(), 1);
    }

    #[test]
    fn responses_diagnostics() {
        init();
        let rules = GradingRules::default_rules();
        let responses = table(
            &["Marca temporal", "Nombre completo", "Grupo ", "1.", "1. [Score]", "2.", "3."],
            &[
                &["t0", "Ana", "3A", "a", "1", "B", "C"],
                &["t1", "", "nan", "", "0", "x", "C"],
                &["t2", "Luis", "", "B", "0", "B", "D"],
                &["t3", "María", "3B", "C", "0", "B", "D"],
            ],
        );
        let d = diagnose_responses(&responses, &rules);
        assert_eq!(d.num_rows, 4);
        assert_eq!(d.num_columns, 7);
        assert_eq!(d.name_column.as_deref(), Some("Nombre completo"));
        assert_eq!(d.email_column, None);
        assert_eq!(d.group_column.as_deref(), Some("Grupo "));
        assert_eq!(d.columns.len(), 3);
        assert_eq!(d.samples.len(), 3);

        let ana = &d.samples[0];
        assert_eq!(ana.name, "Ana");
        assert_eq!(ana.email, "No email");
        assert_eq!(ana.cohort, "3A");
        assert_eq!(
            ana.answers,
            vec![
                (1, Some("a".to_string())),
                (2, Some("B".to_string())),
                (3, Some("C".to_string()))
            ]
        );

        let anonymous = &d.samples[1];
        assert_eq!(anonymous.name, "Student 2");
        assert_eq!(anonymous.group, "No group");
        assert_eq!(anonymous.cohort, "Ungrouped");
        assert_eq!(anonymous.answers[0], (1, None));
        assert_eq!(anonymous.answers[1], (2, Some("x".to_string())));

        // No question column: still a report.
        let d = diagnose_responses(&table(&["Nombre"], &[&["Ana"]]), &rules);
        assert!(d.columns.is_empty());
        assert!(d.samples[0].answers.is_empty());
    }
}
