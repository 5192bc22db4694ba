use log::{debug, info, warn};

use exam_grading::cohort::aggregate_cohorts;
use exam_grading::key::{diagnose_key, KeyDiagnostics};
use exam_grading::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod report;

use crate::args::Args;
use crate::grading::config_reader::*;
use crate::grading::io_common::*;

#[derive(Debug, Snafu)]
pub enum GradeError {
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing CSV file {path}"))]
    CsvParse { source: csv::Error, path: String },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("The file {path} has no header row"))]
    MissingHeader { path: String },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("{source}"))]
    Grading { source: GradingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type GradeResult<T> = Result<T, GradeError>;

/// What the command line asks for.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunSettings {
    pub config: Option<String>,
    pub key: Option<String>,
    pub responses: Option<String>,
    pub input_type: Option<String>,
    pub key_worksheet: Option<String>,
    pub responses_worksheet: Option<String>,
    pub out: Option<String>,
    pub reference: Option<String>,
    pub export_dir: Option<String>,
    pub diagnose: bool,
    pub summary_only: bool,
}

impl From<&Args> for RunSettings {
    fn from(args: &Args) -> Self {
        RunSettings {
            config: args.config.clone(),
            key: args.key.clone(),
            responses: args.responses.clone(),
            input_type: args.input_type.clone(),
            key_worksheet: args.key_worksheet.clone(),
            responses_worksheet: args.responses_worksheet.clone(),
            out: args.out.clone(),
            reference: args.reference.clone(),
            export_dir: args.export_dir.clone(),
            diagnose: args.diagnose,
            summary_only: args.summary_only,
        }
    }
}

// A file to read, after the command line and the configuration are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
struct InputFile {
    path: String,
    provider: Provider,
    worksheet: Option<String>,
}

// Everything needed for a run.
#[derive(PartialEq, Debug, Clone)]
struct Inputs {
    key: InputFile,
    responses: InputFile,
    rules: GradingRules,
    subjects: SubjectMap,
    output_settings: OutputSettings,
    export_dir: Option<String>,
}

/// The outcome of a grading run.
#[derive(PartialEq, Debug, Clone)]
pub struct GradingRun {
    pub results: ExamResults,
    /// `None` when the responses have no student.
    pub cohort: Option<CohortReport>,
    pub subjects: SubjectMap,
    pub summary: JSValue,
    pub export_dir: Option<String>,
}

// The file to read for one input, `None` when neither the command line nor
// the configuration names one.
fn find_input(
    cli_path: &Option<String>,
    cli_worksheet: &Option<String>,
    input_type: &Option<String>,
    source: Option<&FileSource>,
    root: Option<&Path>,
) -> GradeResult<Option<InputFile>> {
    let (path, provider, worksheet) = match (cli_path, source) {
        (Some(p), _) => (p.clone(), input_type.clone(), cli_worksheet.clone()),
        (None, Some(src)) => (
            resolve_path(root, &src.file_path),
            input_type.clone().or_else(|| src.provider.clone()),
            cli_worksheet
                .clone()
                .or_else(|| src.excel_worksheet_name.clone()),
        ),
        (None, None) => return Ok(None),
    };
    let provider = detect_provider(&path, provider.as_deref())?;
    Ok(Some(InputFile {
        path,
        provider,
        worksheet,
    }))
}

fn resolve_input(
    cli_path: &Option<String>,
    cli_worksheet: &Option<String>,
    input_type: &Option<String>,
    source: Option<&FileSource>,
    root: Option<&Path>,
    what: &str,
) -> GradeResult<InputFile> {
    match find_input(cli_path, cli_worksheet, input_type, source, root)? {
        Some(input) => Ok(input),
        None => whatever!(
            "no {} file given: use the command line or the configuration file",
            what
        ),
    }
}

fn load_config(settings: &RunSettings) -> GradeResult<Option<ExamConfig>> {
    match &settings.config {
        Some(p) => Ok(Some(read_config(p)?)),
        None => Ok(None),
    }
}

fn gather_inputs(settings: &RunSettings) -> GradeResult<Inputs> {
    let config = load_config(settings)?;
    let root: Option<&Path> = settings.config.as_deref().and_then(|p| Path::new(p).parent());

    let key = resolve_input(
        &settings.key,
        &settings.key_worksheet,
        &settings.input_type,
        config.as_ref().and_then(|c| c.key_source.as_ref()),
        root,
        "answer key",
    )?;
    let responses = resolve_input(
        &settings.responses,
        &settings.responses_worksheet,
        &settings.input_type,
        config.as_ref().and_then(|c| c.responses_source.as_ref()),
        root,
        "responses",
    )?;

    let (rules, subjects, output_settings) = match &config {
        Some(c) => (
            c.grading_rules()?,
            c.subject_map()?,
            c.output_settings.clone(),
        ),
        None => (
            GradingRules::default_rules(),
            SubjectMap::default_exam(),
            OutputSettings {
                exam_name: simplify_file_name(&responses.path),
                output_directory: None,
                exam_date: None,
            },
        ),
    };

    let export_dir = settings.export_dir.clone().or_else(|| {
        output_settings
            .output_directory
            .as_ref()
            .map(|d| resolve_path(root, d))
    });

    Ok(Inputs {
        key,
        responses,
        rules,
        subjects,
        output_settings,
        export_dir,
    })
}

fn read_table(input: &InputFile) -> GradeResult<MemoryTable> {
    info!("read_table: reading {:?}", input.path);
    match input.provider {
        Provider::Csv => io_csv::read_csv_table(&input.path),
        Provider::Xlsx => io_excel::read_excel_table(&input.path, input.worksheet.as_deref()),
    }
}

fn student_js(r: &StudentRecord) -> JSValue {
    let subjects: Vec<JSValue> = r
        .subjects
        .iter()
        .map(|s| {
            json!({
                "subject": s.subject,
                "correct": s.correct.len(),
                "incorrect": s.incorrect.len(),
                "unanswered": s.unanswered.len(),
                "total": s.total,
                "percentage": s.percentage,
                "score": s.score,
            })
        })
        .collect();
    json!({
        "name": r.name,
        "email": r.email,
        "group": r.group,
        "correct": r.total_correct(),
        "incorrect": r.total_incorrect(),
        "unanswered": r.total_unanswered(),
        "percentage": r.percentage(),
        "score": r.score(),
        "subjects": subjects,
    })
}

fn group_js(g: &GroupAggregate) -> JSValue {
    let distribution: serde_json::Map<String, JSValue> = g
        .distribution
        .bands()
        .iter()
        .map(|(label, count)| (label.to_string(), json!(count)))
        .collect();
    let subjects: Vec<JSValue> = g
        .subjects
        .iter()
        .map(|s| {
            json!({
                "subject": s.subject,
                "meanPercentage": s.mean_percentage,
                "meanCorrect": s.mean_correct,
                "perfect": s.perfect_count,
                "passing": s.passing_count,
            })
        })
        .collect();
    json!({
        "name": g.name,
        "students": g.size(),
        "meanPercentage": g.mean_percentage,
        "meanScore": g.mean_score,
        "best": g.best.name,
        "worst": g.worst.name,
        "distribution": distribution,
        "subjects": subjects,
    })
}

fn build_summary_js(
    inputs: &Inputs,
    results: &ExamResults,
    cohort: Option<&CohortReport>,
) -> JSValue {
    let c = OutputConfig {
        exam: inputs.output_settings.exam_name.clone(),
        date: inputs.output_settings.exam_date.clone(),
        key_file: simplify_file_name(&inputs.key.path),
        responses_file: simplify_file_name(&inputs.responses.path),
    };
    let students: Vec<JSValue> = results.records.iter().map(student_js).collect();
    let (overall, groups, hardest) = match cohort {
        Some(ch) => (
            group_js(&ch.overall),
            ch.groups.iter().map(group_js).collect::<Vec<JSValue>>(),
            ch.difficulty
                .iter()
                .map(|d| {
                    json!({
                        "question": d.question,
                        "misses": d.misses,
                        "errorPercentage": d.error_percentage(),
                    })
                })
                .collect::<Vec<JSValue>>(),
        ),
        None => (JSValue::Null, Vec::new(), Vec::new()),
    };
    json!({
        "config": c,
        "questions": results.answer_key.len(),
        "students": students,
        "overall": overall,
        "groups": groups,
        "hardestQuestions": hardest,
    })
}

/// Reads the inputs, grades the exam and builds the summary. Nothing is
/// printed or written.
pub fn grade_files(settings: &RunSettings) -> GradeResult<GradingRun> {
    let inputs = gather_inputs(settings)?;
    debug!("grade_files: inputs: {:?}", inputs);

    let key_table = read_table(&inputs.key)?;
    let responses = read_table(&inputs.responses)?;

    let results = grade_exam(&key_table, &responses, &inputs.subjects, &inputs.rules)
        .context(GradingSnafu {})?;

    let cohort = if results.records.is_empty() {
        warn!("grade_files: the responses contain no student");
        None
    } else {
        Some(aggregate_cohorts(&results.records, &inputs.rules).context(GradingSnafu {})?)
    };

    let summary = build_summary_js(&inputs, &results, cohort.as_ref());
    Ok(GradingRun {
        results,
        cohort,
        subjects: inputs.subjects,
        summary,
        export_dir: inputs.export_dir,
    })
}

/// The diagnostics of the answer key and of the responses, for the files
/// that are given.
#[derive(PartialEq, Debug, Clone)]
pub struct Diagnostics {
    pub key: Option<KeyDiagnostics>,
    pub responses: Option<ResponsesDiagnostics>,
}

/// Inspects the input files without grading. Either file may be missing,
/// but not both.
pub fn diagnose_files(settings: &RunSettings) -> GradeResult<Diagnostics> {
    let config = load_config(settings)?;
    let root: Option<&Path> = settings.config.as_deref().and_then(|p| Path::new(p).parent());
    let rules = match &config {
        Some(c) => c.grading_rules()?,
        None => GradingRules::default_rules(),
    };

    let key_input = find_input(
        &settings.key,
        &settings.key_worksheet,
        &settings.input_type,
        config.as_ref().and_then(|c| c.key_source.as_ref()),
        root,
    )?;
    let responses_input = find_input(
        &settings.responses,
        &settings.responses_worksheet,
        &settings.input_type,
        config.as_ref().and_then(|c| c.responses_source.as_ref()),
        root,
    )?;
    if key_input.is_none() && responses_input.is_none() {
        whatever!("nothing to diagnose: give an answer key or a responses file");
    }

    let key = match &key_input {
        Some(input) => {
            let table = read_table(input)?;
            Some(diagnose_key(&table, &rules).context(GradingSnafu {})?)
        }
        None => None,
    };
    let responses = match &responses_input {
        Some(input) => {
            let table = read_table(input)?;
            Some(diagnose_responses(&table, &rules))
        }
        None => None,
    };
    Ok(Diagnostics { key, responses })
}

fn run_diagnostics(settings: &RunSettings) -> GradeResult<()> {
    let diag = diagnose_files(settings)?;
    if let Some(k) = &diag.key {
        report::print_key_diagnostics(k);
    }
    if let Some(r) = &diag.responses {
        report::print_responses_diagnostics(r);
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> GradeResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("check_reference: the summary matches {}", reference_path);
    Ok(())
}

pub fn run_grading(settings: &RunSettings) -> GradeResult<()> {
    if settings.diagnose {
        return run_diagnostics(settings);
    }

    let run = grade_files(settings)?;
    let to_stdout = settings.out.as_deref() == Some("stdout");

    if !to_stdout {
        report::print_student_report(&run.results.records, settings.summary_only);
        if let Some(c) = &run.cohort {
            report::print_group_report(c);
            report::print_hardest_questions(&c.difficulty);
        }
    }

    if let Some(dir) = &run.export_dir {
        let written = report::write_exports(dir, &run.results, &run.subjects, run.cohort.as_ref())?;
        info!("run_grading: wrote {} reports to {}", written.len(), dir);
    }

    let pretty_js_stats = serde_json::to_string_pretty(&run.summary).context(WritingJsonSnafu {})?;

    match settings.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) if !path.is_empty() => {
            fs::write(path, &pretty_js_stats).context(WritingFileSnafu { path })?;
            info!("run_grading: summary written to {}", path);
        }
        _ => {}
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &settings.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_file(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn config_settings() -> RunSettings {
        RunSettings {
            config: Some(test_file("exam_config.json")),
            ..Default::default()
        }
    }

    #[test]
    fn diagnostics() {
        let d = diagnose_files(&config_settings()).unwrap();
        let key = d.key.unwrap();
        assert_eq!(key.valid.len(), 10);
        let responses = d.responses.unwrap();
        assert_eq!(responses.num_rows, 5);
        assert_eq!(responses.columns.len(), 10);
        assert_eq!(responses.name_column.as_deref(), Some("Nombre completo"));
        assert_eq!(responses.group_column.as_deref(), Some("Grupo "));
        assert_eq!(responses.samples.len(), 3);
        assert_eq!(responses.samples[0].name, "Ana Torres");

        // Only the responses.
        let settings = RunSettings {
            responses: Some(test_file("responses.csv")),
            diagnose: true,
            ..Default::default()
        };
        let d = diagnose_files(&settings).unwrap();
        assert_eq!(d.key, None);
        assert_eq!(d.responses.unwrap().samples[0].cohort, "3A");

        assert!(diagnose_files(&RunSettings::default()).is_err());
    }

    #[test]
    fn grade_with_config() {
        let run = grade_files(&config_settings()).unwrap();
        let records = &run.results.records;
        assert_eq!(run.results.answer_key.len(), 10);
        assert_eq!(records.len(), 5);

        let ana = &records[0];
        assert_eq!(ana.name, "Ana Torres");
        assert_eq!(ana.group, "3A");
        assert_eq!(ana.total_correct(), 10);
        assert_eq!(ana.percentage(), 100.0);

        let luis = &records[1];
        assert_eq!(luis.total_correct(), 7);
        assert_eq!(luis.total_incorrect(), 2);
        assert_eq!(luis.total_unanswered(), 1);
        assert_eq!(luis.subject("Algebra").unwrap().percentage, 80.0);
        assert_eq!(luis.subject("Geometry").unwrap().percentage, 60.0);

        // No name and no group.
        let anonymous = &records[4];
        assert_eq!(anonymous.name, "Student 5");
        assert_eq!(anonymous.group, "No group");

        let cohort = run.cohort.unwrap();
        assert_eq!(cohort.groups.len(), 3);
        assert_eq!(cohort.group("3A").unwrap().size(), 2);
        assert_eq!(cohort.group("Ungrouped").unwrap().size(), 2);
        assert_eq!(cohort.overall.size(), 5);

        assert_eq!(run.summary["config"]["exam"], "Mock exam");
        assert_eq!(run.summary["students"].as_array().unwrap().len(), 5);
        assert_eq!(run.summary["questions"], 10);
    }

    #[test]
    fn command_line_overrides() {
        let settings = RunSettings {
            key: Some(test_file("key.csv")),
            responses: Some(test_file("responses.csv")),
            ..Default::default()
        };
        let run = grade_files(&settings).unwrap();
        // The standard subjects are used without a configuration.
        assert_eq!(run.subjects, SubjectMap::default_exam());
        assert_eq!(run.results.records.len(), 5);
        assert_eq!(run.export_dir, None);
        assert_eq!(run.summary["config"]["exam"], "responses.csv");
    }

    #[test]
    fn missing_inputs() {
        let settings = RunSettings {
            key: Some(test_file("key.csv")),
            ..Default::default()
        };
        assert!(grade_files(&settings).is_err());

        let settings = RunSettings {
            key: Some(test_file("no_such_key.csv")),
            responses: Some(test_file("responses.csv")),
            ..Default::default()
        };
        assert!(matches!(
            grade_files(&settings),
            Err(GradeError::OpeningFile { .. })
        ));
    }

    #[test]
    fn responses_without_questions() {
        let settings = RunSettings {
            key: Some(test_file("key.csv")),
            responses: Some(test_file("no_questions.csv")),
            ..Default::default()
        };
        assert!(matches!(
            grade_files(&settings),
            Err(GradeError::Grading {
                source: GradingErrors::NoQuestionColumns
            })
        ));
    }

    #[test]
    fn reference_summary() {
        let run = grade_files(&config_settings()).unwrap();
        let pretty = serde_json::to_string_pretty(&run.summary).unwrap();

        let dir = std::env::temp_dir().join("examgrade_reference_test");
        fs::create_dir_all(&dir).unwrap();
        let reference = dir.join("summary.json");
        fs::write(&reference, &pretty).unwrap();
        let reference = reference.display().to_string();
        assert!(check_reference(&reference, &pretty).is_ok());

        let altered = pretty.replace("Ana Torres", "Ana Torre");
        assert!(check_reference(&reference, &altered).is_err());
    }

    #[test]
    fn exports() {
        let dir = std::env::temp_dir().join("examgrade_exports_test");
        let settings = RunSettings {
            export_dir: Some(dir.display().to_string()),
            ..config_settings()
        };
        let run = grade_files(&settings).unwrap();
        let written = report::write_exports(
            run.export_dir.as_deref().unwrap(),
            &run.results,
            &run.subjects,
            run.cohort.as_ref(),
        )
        .unwrap();
        assert_eq!(written.len(), 5);
        let matrix = fs::read_to_string(dir.join("error_matrix.csv")).unwrap();
        assert!(matrix.starts_with("Name,Email,Group,Correct,Incorrect,Unanswered,P1,"));
        assert_eq!(matrix.lines().count(), 6);
    }
}
