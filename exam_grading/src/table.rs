//! The access layer to tabular data.
//!
//! The grading code only needs the ordered column labels and a way to read a
//! cell by (row, label). Readers for concrete formats (CSV, spreadsheets)
//! produce a `MemoryTable`, usually through the `TableBuilder`.

/// The content of one cell, as produced by the readers.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    /// Empty cell, missing column or missing row.
    Missing,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// The textual content of the cell, `None` for missing cells.
    ///
    /// Whole floats are written without a fractional part: spreadsheets
    /// often store integer-looking values (group numbers) as floats.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) if f.is_nan() => None,
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", *f as i64))
            }
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// The trimmed textual content, treating blanks and the usual
    /// stringified missing markers (`nan`, `none`) as missing.
    pub fn to_clean_text(&self) -> Option<String> {
        let s = self.to_text()?;
        let trimmed = s.trim();
        if trimmed.is_empty() || is_missing_marker(trimmed) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// True for the textual forms of a missing value.
pub fn is_missing_marker(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "nan" | "none" | "null")
}

pub trait Table {
    /// The column labels, in order.
    fn labels(&self) -> &[String];

    /// Number of data rows (the header is not a data row).
    fn row_count(&self) -> usize;

    /// The cell of the given data row under the given column label.
    /// Unknown labels and out-of-range rows return `Cell::Missing`.
    fn cell(&self, row: usize, label: &str) -> Cell;
}

/// A table fully loaded in memory.
///
/// When several columns carry the same label, lookups by label resolve to
/// the first one.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct MemoryTable {
    pub(crate) labels: Vec<String>,
    pub(crate) rows: Vec<Vec<Cell>>,
}

impl MemoryTable {
    pub fn new(labels: Vec<String>, rows: Vec<Vec<Cell>>) -> MemoryTable {
        MemoryTable { labels, rows }
    }

    fn column_position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

impl Table for MemoryTable {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, label: &str) -> Cell {
        self.column_position(label)
            .and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
            .cloned()
            .unwrap_or(Cell::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_outside_the_table_are_missing() {
        let t = MemoryTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Cell::Int(1)]],
        );
        assert_eq!(t.cell(0, "a"), Cell::Int(1));
        assert_eq!(t.cell(0, "b"), Cell::Missing);
        assert_eq!(t.cell(3, "a"), Cell::Missing);
        assert_eq!(t.cell(0, "zz"), Cell::Missing);
    }

    #[test]
    fn clean_text() {
        assert_eq!(Cell::Float(3.0).to_clean_text(), Some("3".to_string()));
        assert_eq!(Cell::Float(f64::NAN).to_clean_text(), None);
        assert_eq!(Cell::Text("  nan ".to_string()).to_clean_text(), None);
        assert_eq!(Cell::Text(" None".to_string()).to_clean_text(), None);
        assert_eq!(Cell::Text(" 3B ".to_string()).to_clean_text(), Some("3B".to_string()));
    }
}
