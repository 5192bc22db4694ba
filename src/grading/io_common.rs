use std::path::Path;

use crate::grading::*;

/// The file formats that can be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The format of a file: given explicitly, or deduced from its extension.
pub fn detect_provider(path: &str, explicit: Option<&str>) -> GradeResult<Provider> {
    let name = match explicit {
        Some(x) => x.to_lowercase(),
        None => Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default(),
    };
    match name.as_str() {
        "csv" | "txt" => Ok(Provider::Csv),
        "xlsx" | "xlsm" | "excel" => Ok(Provider::Xlsx),
        "" => whatever!(
            "cannot guess the type of {}, please specify the input type",
            path
        ),
        x => whatever!("input type not implemented: {:?}", x),
    }
}

/// Paths in a configuration file are relative to the directory of that file.
pub fn resolve_path(root: Option<&Path>, file_path: &str) -> String {
    match root {
        Some(r) if Path::new(file_path).is_relative() => r.join(file_path).display().to_string(),
        _ => file_path.to_string(),
    }
}
