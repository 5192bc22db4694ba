// Console and CSV reports.

use std::path::Path;

use exam_grading::cohort::status_label;
use exam_grading::key::{KeyDiagnostics, KeyHealth};

use crate::grading::*;

const LINE_WIDTH: usize = 70;
const HARDEST_SHOWN: usize = 10;

/// A text bar such as `[########            ] 40%`.
///
/// The fill character tells the level: `#` from 80%, `=` from 60%, `-` below.
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let clamped = percentage.max(0.0).min(100.0);
    let filled = ((clamped / 100.0) * width as f64) as usize;
    let symbol = if percentage >= 80.0 {
        '#'
    } else if percentage >= 60.0 {
        '='
    } else {
        '-'
    };
    format!(
        "[{}{}] {}%",
        symbol.to_string().repeat(filled),
        " ".repeat(width - filled),
        percentage
    )
}

pub fn format_questions(questions: &[QuestionIndex]) -> String {
    questions
        .iter()
        .map(|q| q.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

pub fn print_student_report(records: &[StudentRecord], summary_only: bool) {
    println!("\n{}", "=".repeat(LINE_WIDTH));
    println!("RESULTS ({} students)", records.len());
    println!("{}", "=".repeat(LINE_WIDTH));

    for r in records.iter() {
        println!("\n{}", "-".repeat(LINE_WIDTH));
        println!("{} <{}> ({})", r.name, r.email, r.group);
        println!("{}", "-".repeat(LINE_WIDTH));
        println!(
            "   Score: {:.2}/{}   {}",
            r.score(),
            r.score_scale,
            status_label(r.percentage())
        );
        println!("   {}", progress_bar(r.percentage(), 40));
        println!(
            "   Correct: {}   Incorrect: {}   Unanswered: {}   Total: {}",
            r.total_correct(),
            r.total_incorrect(),
            r.total_unanswered(),
            r.total_questions()
        );
        if summary_only {
            continue;
        }
        for s in r.subjects.iter() {
            println!(
                "     {:15} {:3}/{:<3} {:6.2}/{}",
                s.subject,
                s.correct.len(),
                s.total,
                s.score,
                r.score_scale
            );
            println!("       {}", progress_bar(s.percentage, 25));
            if !s.incorrect.is_empty() {
                println!("       incorrect: {}", format_questions(&s.incorrect));
            }
        }
    }
}

pub fn print_group_report(cohort: &CohortReport) {
    println!("\n{}", "=".repeat(LINE_WIDTH));
    println!("GROUP STATISTICS");
    println!("{}", "=".repeat(LINE_WIDTH));

    for g in std::iter::once(&cohort.overall).chain(cohort.groups.iter()) {
        println!("\n{} ({} students)", g.name, g.size());
        println!("{}", "-".repeat(LINE_WIDTH));
        println!(
            "  Mean: {:.2}%  score {:.2}  correct {:.2}/{}",
            g.mean_percentage, g.mean_score, g.mean_correct, g.total_questions
        );
        println!(
            "  Best: {} ({}%)   Worst: {} ({}%)",
            g.best.name, g.best.percentage, g.worst.name, g.worst.percentage
        );
        for (label, count) in g.distribution.bands() {
            println!("    {:26} {}", label, count);
        }
        for s in g.subjects.iter() {
            println!(
                "    {:15}: {:5.1}%  {}",
                s.subject,
                s.mean_percentage,
                progress_bar(s.mean_percentage, 20)
            );
        }
    }
}

pub fn print_hardest_questions(difficulty: &[QuestionDifficulty]) {
    println!("\n{}", "=".repeat(LINE_WIDTH));
    println!("HARDEST QUESTIONS");
    println!("{}", "=".repeat(LINE_WIDTH));
    if difficulty.is_empty() {
        println!("  No question was missed.");
        return;
    }
    for d in difficulty.iter().take(HARDEST_SHOWN) {
        println!(
            "  Question {:3}: {} of {} students ({}%)",
            d.question,
            d.misses,
            d.students,
            d.error_percentage()
        );
    }
}

pub fn print_key_diagnostics(diag: &KeyDiagnostics) {
    println!("\n{}", "=".repeat(LINE_WIDTH));
    println!("ANSWER KEY DIAGNOSTICS");
    println!("{}", "=".repeat(LINE_WIDTH));
    println!("  Question columns: {}", diag.columns.len());
    for (q, label) in diag.columns.iter() {
        println!("    {:3} <- {:?}", q, label);
    }
    println!("  Valid entries: {}", diag.valid.len());
    println!("  Blank entries: {}", diag.blank.len());
    if !diag.blank.is_empty() {
        println!("    questions: {}", format_questions(&diag.blank));
    }
    println!("  Invalid entries: {}", diag.invalid.len());
    for (q, text) in diag.invalid.iter() {
        println!("    question {}: {:?}", q, text);
    }
    match diag.health() {
        KeyHealth::Critical => println!(
            "\nCRITICAL: the key has no valid answer. Check that the first data row holds the answers."
        ),
        KeyHealth::Incomplete => println!(
            "\nWARNING: less than 80% of the questions have a valid answer in the key."
        ),
        KeyHealth::Ok => println!("\nThe key looks fine."),
    }
}

pub fn print_responses_diagnostics(diag: &ResponsesDiagnostics) {
    println!("\n{}", "=".repeat(LINE_WIDTH));
    println!("RESPONSES DIAGNOSTICS");
    println!("{}", "=".repeat(LINE_WIDTH));
    println!("  Rows: {}", diag.num_rows);
    println!("  Columns: {}", diag.num_columns);
    for (field, col) in [
        ("Name", &diag.name_column),
        ("Email", &diag.email_column),
        ("Group", &diag.group_column),
    ] {
        match col {
            Some(c) => println!("  {} column: {:?}", field, c),
            None => println!("  {} column: not found", field),
        }
    }
    println!("  Question columns: {}", diag.columns.len());
    if diag.columns.is_empty() {
        println!("\nCRITICAL: no column looks like a question (1., question_1, P1, ...).");
        return;
    }
    for s in diag.samples.iter() {
        println!("\n  Row {}: {} <{}>", s.row + 1, s.name, s.email);
        println!("    group: {} (statistics: {})", s.group, s.cohort);
        let answers: Vec<String> = s
            .answers
            .iter()
            .map(|(q, a)| format!("{}={}", q, a.as_deref().unwrap_or("-")))
            .collect();
        println!("    answers: {}", answers.join(" "));
    }
}

// ********** CSV exports **********

pub fn results_rows(records: &[StudentRecord], subjects: &SubjectMap) -> Vec<Vec<String>> {
    let mut header: Vec<String> = [
        "Name",
        "Email",
        "Group",
        "Correct",
        "Incorrect",
        "Unanswered",
        "Total",
        "Percentage",
        "Score",
        "Status",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for s in subjects.subjects() {
        header.push(format!("{} correct", s.name));
        header.push(format!("{} total", s.name));
    }

    let mut res = vec![header];
    for r in records.iter() {
        let mut row = vec![
            r.name.clone(),
            r.email.clone(),
            r.group.clone(),
            r.total_correct().to_string(),
            r.total_incorrect().to_string(),
            r.total_unanswered().to_string(),
            r.total_questions().to_string(),
            r.percentage().to_string(),
            r.score().to_string(),
            status_label(r.percentage()).to_string(),
        ];
        for s in subjects.subjects() {
            match r.subject(&s.name) {
                Some(sr) => {
                    row.push(sr.correct.len().to_string());
                    row.push(sr.total.to_string());
                }
                None => {
                    row.push("0".to_string());
                    row.push("0".to_string());
                }
            }
        }
        res.push(row);
    }
    res
}

/// One row per student: 0 for a correct answer, 1 for an incorrect one,
/// blank otherwise.
pub fn error_matrix_rows(records: &[StudentRecord], last_question: QuestionIndex) -> Vec<Vec<String>> {
    let mut header: Vec<String> = ["Name", "Email", "Group", "Correct", "Incorrect", "Unanswered"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend((1..=last_question).map(|q| format!("P{}", q)));

    let mut res = vec![header];
    for r in records.iter() {
        let mut row = vec![
            r.name.clone(),
            r.email.clone(),
            r.group.clone(),
            r.total_correct().to_string(),
            r.total_incorrect().to_string(),
            r.total_unanswered().to_string(),
        ];
        row.extend(
            r.correctness_row(last_question)
                .iter()
                .map(|c| c.map(|x| x.to_string()).unwrap_or_default()),
        );
        res.push(row);
    }
    res
}

/// The subjects in which each student made at least one mistake.
pub fn errors_by_subject_rows(records: &[StudentRecord]) -> Vec<Vec<String>> {
    let header: Vec<String> = [
        "Name",
        "Email",
        "Group",
        "Subject",
        "Correct",
        "Incorrect",
        "Unanswered",
        "Total",
        "Incorrect questions",
        "Unanswered questions",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let mut res = vec![header];
    for r in records.iter() {
        for s in r.subjects.iter().filter(|s| !s.incorrect.is_empty()) {
            res.push(vec![
                r.name.clone(),
                r.email.clone(),
                r.group.clone(),
                s.subject.clone(),
                s.correct.len().to_string(),
                s.incorrect.len().to_string(),
                s.unanswered.len().to_string(),
                s.total.to_string(),
                format_questions(&s.incorrect),
                format_questions(&s.unanswered),
            ]);
        }
    }
    res
}

pub fn hardest_questions_rows(difficulty: &[QuestionDifficulty]) -> Vec<Vec<String>> {
    let mut res = vec![vec![
        "Question".to_string(),
        "Misses".to_string(),
        "Students".to_string(),
        "Error percentage".to_string(),
    ]];
    for d in difficulty.iter() {
        res.push(vec![
            d.question.to_string(),
            d.misses.to_string(),
            d.students.to_string(),
            d.error_percentage().to_string(),
        ]);
    }
    res
}

/// One row per group, from the best mean percentage down.
pub fn group_metrics_rows(cohort: &CohortReport) -> Vec<Vec<String>> {
    let mut groups: Vec<&GroupAggregate> = cohort.groups.iter().collect();
    groups.sort_by(|a, b| {
        b.mean_percentage
            .partial_cmp(&a.mean_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.name.cmp(&b.name))
    });

    let mut header: Vec<String> = [
        "Rank",
        "Group",
        "Students",
        "Mean percentage",
        "Mean score",
        "Mean correct",
        "Max percentage",
        "Min percentage",
        "Best student",
        "Worst student",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for (label, _) in cohort.overall.distribution.bands() {
        header.push(label.to_string());
    }
    for s in cohort.overall.subjects.iter() {
        header.push(format!("{} mean %", s.subject));
    }

    let mut res = vec![header];
    for (idx, g) in groups.iter().enumerate() {
        let mut row = vec![
            (idx + 1).to_string(),
            g.name.clone(),
            g.size().to_string(),
            g.mean_percentage.to_string(),
            g.mean_score.to_string(),
            g.mean_correct.to_string(),
            g.max_percentage.to_string(),
            g.min_percentage.to_string(),
            g.best.name.clone(),
            g.worst.name.clone(),
        ];
        for (_, count) in g.distribution.bands() {
            row.push(count.to_string());
        }
        for s in cohort.overall.subjects.iter() {
            row.push(
                g.subject(&s.subject)
                    .map(|x| x.mean_percentage.to_string())
                    .unwrap_or_default(),
            );
        }
        res.push(row);
    }
    res
}

fn write_csv(path: &Path, rows: &[Vec<String>]) -> GradeResult<()> {
    let p = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: p.clone() })?;
    for row in rows.iter() {
        wtr.write_record(row)
            .context(CsvWriteSnafu { path: p.clone() })?;
    }
    wtr.flush().context(WritingFileSnafu { path: p.clone() })?;
    info!("write_csv: wrote {} rows to {}", rows.len().saturating_sub(1), p);
    Ok(())
}

/// Writes all the CSV reports into the directory, which is created if needed.
/// Returns the paths of the files written.
pub fn write_exports(
    dir: &str,
    results: &ExamResults,
    subjects: &SubjectMap,
    cohort: Option<&CohortReport>,
) -> GradeResult<Vec<String>> {
    fs::create_dir_all(dir).context(WritingFileSnafu { path: dir })?;
    let root = Path::new(dir);
    let records = &results.records;

    let mut files: Vec<(&str, Vec<Vec<String>>)> = vec![
        ("results.csv", results_rows(records, subjects)),
        (
            "error_matrix.csv",
            error_matrix_rows(records, results.answer_key.last_question()),
        ),
        ("errors_by_subject.csv", errors_by_subject_rows(records)),
    ];
    if let Some(c) = cohort {
        files.push(("hardest_questions.csv", hardest_questions_rows(&c.difficulty)));
        files.push(("group_metrics.csv", group_metrics_rows(c)));
    }

    let mut written: Vec<String> = Vec::new();
    for (name, rows) in files.iter() {
        let p = root.join(name);
        write_csv(&p, rows)?;
        written.push(p.display().to_string());
    }
    Ok(written)
}
