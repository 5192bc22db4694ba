// Primitives for reading CSV files.

use exam_grading::builder::TableBuilder;

use crate::grading::*;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reads a CSV file whose first record holds the column labels.
pub fn read_csv_table(path: &str) -> GradeResult<MemoryTable> {
    let bytes = fs::read(path).context(OpeningFileSnafu { path })?;
    let text = decode_text(&bytes);
    parse_csv_text(&text, path)
}

/// Form exports are usually UTF-8, sometimes with a byte order mark, and
/// sometimes Latin-1 when they went through a spreadsheet program.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) => {
            info!(
                "decode_text: not valid UTF-8 ({}), decoding as Latin-1",
                e
            );
            bytes.iter().map(|b| *b as char).collect()
        }
    }
}

pub fn parse_csv_text(text: &str, path: &str) -> GradeResult<MemoryTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = rdr.into_records();

    let header = match records.next() {
        Some(h) => h.context(CsvParseSnafu { path })?,
        None => return MissingHeaderSnafu { path }.fail(),
    };
    let labels: Vec<&str> = header.iter().collect();
    debug!("parse_csv_text: {}: header: {:?}", path, labels);
    let mut builder = TableBuilder::new(&labels);

    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvParseSnafu { path })?;
        if line.iter().all(|s| s.trim().is_empty()) {
            debug!("parse_csv_text: {}: skipping empty line {}", path, lineno);
            continue;
        }
        let values: Vec<&str> = line.iter().collect();
        builder.add_text_row(&values);
    }
    info!(
        "parse_csv_text: {}: {} columns, {} rows",
        simplify_file_name(path),
        labels.len(),
        builder.num_rows()
    );
    Ok(builder.build())
}
