use log::debug;

pub use crate::table::*;

/// A builder for assembling a table row by row.
///
/// This is what the file readers use, and the simplest way to feed data
/// from code.
///
/// ```
/// use exam_grading::builder::TableBuilder;
/// use exam_grading::table::{Cell, Table};
///
/// let mut builder = TableBuilder::new(&["Name", "1.", "2."]);
/// builder.add_text_row(&["Anna", "A", ""]);
///
/// let table = builder.build();
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(table.cell(0, "2."), Cell::Missing);
/// ```
pub struct TableBuilder {
    _labels: Vec<String>,
    _rows: Vec<Vec<Cell>>,
}

impl TableBuilder {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> TableBuilder {
        TableBuilder {
            _labels: labels.iter().map(|s| s.as_ref().to_string()).collect(),
            _rows: Vec::new(),
        }
    }

    /// Adds a row of cells.
    ///
    /// Short rows are completed with missing cells, cells beyond the last
    /// column are dropped.
    pub fn add_row(&mut self, cells: Vec<Cell>) {
        let mut row = cells;
        if row.len() > self._labels.len() {
            debug!(
                "add_row: row {}: dropping {} cells beyond the last column",
                self._rows.len(),
                row.len() - self._labels.len()
            );
            row.truncate(self._labels.len());
        }
        while row.len() < self._labels.len() {
            row.push(Cell::Missing);
        }
        self._rows.push(row);
    }

    /// Adds a row of text values. Empty strings become missing cells.
    pub fn add_text_row<S: AsRef<str>>(&mut self, values: &[S]) {
        let cells = values
            .iter()
            .map(|s| match s.as_ref() {
                "" => Cell::Missing,
                x => Cell::Text(x.to_string()),
            })
            .collect();
        self.add_row(cells)
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> MemoryTable {
        MemoryTable::new(self._labels, self._rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_and_truncated() {
        let mut b = TableBuilder::new(&["a", "b"]);
        b.add_row(vec![Cell::Int(1)]);
        b.add_row(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]);
        let t = b.build();
        assert_eq!(t.rows[0], vec![Cell::Int(1), Cell::Missing]);
        assert_eq!(t.rows[1], vec![Cell::Int(1), Cell::Int(2)]);
    }
}
