use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use exam_grading::builder::TableBuilder;

use crate::grading::*;

/// Reads an Excel worksheet whose first row holds the column labels.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> GradeResult<MemoryTable> {
    let wrange = get_range(path, worksheet_name)?;
    range_to_table(&wrange, path)
}

pub fn range_to_table(wrange: &Range<DataType>, path: &str) -> GradeResult<MemoryTable> {
    let mut rows = wrange.rows();
    let header = rows.next().context(MissingHeaderSnafu { path })?;
    let labels: Vec<String> = header
        .iter()
        .map(|dt| convert_cell(dt).to_text().unwrap_or_default())
        .collect();
    debug!("range_to_table: {}: header: {:?}", path, labels);

    let mut builder = TableBuilder::new(&labels);
    for (idx, row) in rows.enumerate() {
        let cells: Vec<Cell> = row.iter().map(convert_cell).collect();
        if cells.iter().all(|c| *c == Cell::Missing) {
            debug!("range_to_table: {}: skipping empty row {}", path, idx + 2);
            continue;
        }
        builder.add_row(cells);
    }
    info!(
        "range_to_table: {}: {} columns, {} rows",
        simplify_file_name(path),
        labels.len(),
        builder.num_rows()
    );
    Ok(builder.build())
}

pub fn convert_cell(dt: &DataType) -> Cell {
    match dt {
        DataType::String(s) if s.trim().is_empty() => Cell::Missing,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Int(i) => Cell::Int(*i),
        DataType::Float(f) => Cell::Float(*f),
        DataType::Bool(b) => Cell::Bool(*b),
        // Dates are not expected in the answer columns.
        DataType::DateTime(f) => Cell::Float(*f),
        DataType::Error(e) => {
            debug!("convert_cell: error cell {:?} read as missing", e);
            Cell::Missing
        }
        _ => Cell::Missing,
    }
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> GradeResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(convert_cell(&DataType::Empty), Cell::Missing);
        assert_eq!(convert_cell(&DataType::String(" ".to_string())), Cell::Missing);
        assert_eq!(
            convert_cell(&DataType::String("b.".to_string())),
            Cell::Text("b.".to_string())
        );
        assert_eq!(convert_cell(&DataType::Float(3.0)), Cell::Float(3.0));
        assert_eq!(convert_cell(&DataType::Int(2)), Cell::Int(2));
    }

    #[test]
    fn worksheet_to_table() {
        let mut r: Range<DataType> = Range::new((0, 0), (2, 2));
        r.set_value((0, 0), DataType::String("Nombre".to_string()));
        r.set_value((0, 1), DataType::Float(1.0));
        r.set_value((0, 2), DataType::String("P2".to_string()));
        r.set_value((1, 0), DataType::String("Ana".to_string()));
        r.set_value((1, 1), DataType::String("a".to_string()));
        // Row 2 is left empty.
        let t = range_to_table(&r, "test.xlsx").unwrap();
        assert_eq!(t.labels(), &["Nombre", "1", "P2"]);
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.cell(0, "1"), Cell::Text("a".to_string()));
        assert_eq!(t.cell(0, "P2"), Cell::Missing);
    }
}
