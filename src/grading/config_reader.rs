use crate::grading::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "examName")]
    pub exam_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "examDate")]
    pub exam_date: Option<String>,
}

/// The description of the exam, as written in the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub exam: String,
    pub date: Option<String>,
    #[serde(rename = "keyFile")]
    pub key_file: String,
    #[serde(rename = "responsesFile")]
    pub responses_file: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// csv or xlsx. Deduced from the extension of the file when missing.
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub name: String,
    #[serde(rename = "firstQuestion")]
    pub first_question: QuestionIndex,
    #[serde(rename = "lastQuestion")]
    pub last_question: QuestionIndex,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct IdentityColumnsConfig {
    pub name: Option<Vec<String>>,
    pub email: Option<Vec<String>>,
    pub group: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholdersConfig {
    #[serde(rename = "namePrefix")]
    pub name_prefix: Option<String>,
    pub email: Option<String>,
    pub group: Option<String>,
    pub ungrouped: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExamConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "keySource")]
    pub key_source: Option<FileSource>,
    #[serde(rename = "responsesSource")]
    pub responses_source: Option<FileSource>,
    pub subjects: Option<Vec<SubjectConfig>>,
    #[serde(rename = "totalQuestions")]
    pub total_questions: Option<usize>,
    #[serde(rename = "validAnswers")]
    pub valid_answers: Option<Vec<String>>,
    #[serde(rename = "identityColumns")]
    pub identity_columns: Option<IdentityColumnsConfig>,
    pub placeholders: Option<PlaceholdersConfig>,
    #[serde(rename = "scoreScale")]
    pub score_scale: Option<f64>,
    #[serde(rename = "keyPolicy")]
    pub key_policy: Option<String>,
    #[serde(rename = "passingPercentage")]
    pub passing_percentage: Option<f64>,
    #[serde(rename = "maxQuestion")]
    pub max_question: Option<QuestionIndex>,
}

impl ExamConfig {
    /// The grading rules: the defaults, overridden by what the file specifies.
    pub fn grading_rules(&self) -> GradeResult<GradingRules> {
        let mut rules = GradingRules::default_rules();

        if let Some(letters) = &self.valid_answers {
            let mut valid: Vec<char> = Vec::new();
            for l in letters.iter() {
                let mut chars = l.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => valid.push(c.to_ascii_uppercase()),
                    _ => whatever!("validAnswers: expected single letters, found {:?}", l),
                }
            }
            if valid.is_empty() {
                whatever!("validAnswers: at least one letter is required");
            }
            rules.valid_answers = valid;
        }

        if let Some(ic) = &self.identity_columns {
            let cols = &mut rules.identity_columns;
            if let Some(x) = &ic.name {
                cols.name = x.clone();
            }
            if let Some(x) = &ic.email {
                cols.email = x.clone();
            }
            if let Some(x) = &ic.group {
                cols.group = x.clone();
            }
        }

        if let Some(pc) = &self.placeholders {
            let ph = &mut rules.placeholders;
            if let Some(x) = &pc.name_prefix {
                ph.name_prefix = x.clone();
            }
            if let Some(x) = &pc.email {
                ph.email = x.clone();
            }
            if let Some(x) = &pc.group {
                ph.group = x.clone();
            }
            if let Some(x) = &pc.ungrouped {
                ph.ungrouped = x.clone();
            }
        }

        match self.score_scale {
            Some(x) if x > 0.0 => rules.score_scale = x,
            Some(x) => whatever!("scoreScale must be positive, found {}", x),
            None => {}
        }

        match self.passing_percentage {
            Some(x) if (0.0..=100.0).contains(&x) => rules.passing_percentage = x,
            Some(x) => whatever!("passingPercentage must be between 0 and 100, found {}", x),
            None => {}
        }

        match self.max_question {
            Some(0) => whatever!("maxQuestion must be at least 1"),
            Some(x) => rules.max_question = x,
            None => {}
        }

        rules.key_policy = match self.key_policy.as_deref() {
            None | Some("skipInvalid") => KeyEntryPolicy::SkipInvalid,
            Some("strict") => KeyEntryPolicy::Strict,
            Some(x) => whatever!("unknown key policy: {}", x),
        };

        Ok(rules)
    }

    /// The subjects of the exam. The standard layout is used when the file
    /// does not list any.
    pub fn subject_map(&self) -> GradeResult<SubjectMap> {
        let subjects = match &self.subjects {
            Some(x) if !x.is_empty() => x,
            _ => return Ok(SubjectMap::default_exam()),
        };
        let max_question = self.max_question.unwrap_or(DEFAULT_MAX_QUESTION);
        let mut res: Vec<Subject> = Vec::new();
        for s in subjects.iter() {
            if s.last_question > max_question {
                whatever!(
                    "subject {:?}: question {} is above the maximum question number {}",
                    s.name,
                    s.last_question,
                    max_question
                );
            }
            if s.first_question == 0 || s.first_question > s.last_question {
                whatever!(
                    "subject {:?}: invalid question range {}-{}",
                    s.name,
                    s.first_question,
                    s.last_question
                );
            }
            res.push(Subject::new(&s.name, s.first_question, s.last_question));
        }
        let map = SubjectMap::new(res);
        if let Some(total) = self.total_questions {
            if map.declared_total() != total {
                warn!(
                    "subject_map: the subjects declare {} questions but totalQuestions is {}",
                    map.declared_total(),
                    total
                );
            }
        }
        Ok(map)
    }
}

pub fn read_config(path: &str) -> GradeResult<ExamConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: ExamConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> GradeResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
