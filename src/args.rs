use clap::Parser;

/// This is a grading program for multiple-choice exams.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the exam: input files, subjects and grading rules.
    /// For more information about the file format, read the documentation of the exam_grading::manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The file containing the answer key in its first data row. Setting this option overrides
    /// the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub key: Option<String>,

    /// (file path) The file containing the responses of the students, one row per student. Setting this
    /// option overrides the path that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub responses: Option<String>,

    /// (csv or xlsx) The type of the input files. By default, it is deduced from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file for the key, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub key_worksheet: Option<String>,

    /// When using an Excel file for the responses, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub responses_worksheet: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the grading will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, examgrade will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (directory) If specified, the CSV reports are written to this directory. Setting this option
    /// overrides the output directory of the --config option.
    #[clap(long, value_parser)]
    pub export_dir: Option<String>,

    /// Only inspects the input files, without grading: the entries of the answer key, and the
    /// identity columns, question columns and first students of the responses. Either file may
    /// be omitted.
    #[clap(long, takes_value = false)]
    pub diagnose: bool,

    /// Does not print the per-subject breakdown of each student.
    #[clap(long, takes_value = false)]
    pub summary_only: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
