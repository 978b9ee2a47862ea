// Reading survey exports in Excel format (the download format of several
// form tools).

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use survey_report::{Column, Table};

use crate::report::{CliResult, EmptyExcelSnafu, OpeningExcelSnafu};

pub fn read_xlsx_table(path: &str, worksheet: Option<&str>) -> CliResult<Table> {
    let range = get_range(path, worksheet)?;
    let mut rows = range.rows();
    let header = rows.next().context(EmptyExcelSnafu { path })?;
    let mut columns: Vec<Column> = header
        .iter()
        .map(|cell| Column {
            header: cell_to_string(cell),
            cells: Vec::new(),
        })
        .collect();

    for row in rows {
        for (col, column) in columns.iter_mut().enumerate() {
            let value = row.get(col).map(cell_to_string).unwrap_or_default();
            column.cells.push(value);
        }
    }
    debug!("workbook {:?}: {} columns", path, columns.len());
    Ok(Table { columns })
}

/// Stringifies a cell the way it would read in the exported table. Whole
/// floats lose the trailing ".0" so numeric answer scales group correctly.
fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        other => other.to_string(),
    }
}

fn get_range(path: &str, worksheet: Option<&str>) -> CliResult<calamine::Range<DataType>> {
    debug!(
        "read_xlsx_table: path: {:?} worksheet: {:?}",
        path, worksheet
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet {
        let range = workbook
            .worksheet_range(worksheet_name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        return Ok(range);
    }

    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => EmptyExcelSnafu { path }.fail(),
        [(worksheet_name, range)] => {
            debug!("read_xlsx_table: using worksheet {:?}", worksheet_name);
            Ok(range.clone())
        }
        many => {
            // Form exports keep the answers on the first sheet.
            let (worksheet_name, range) = &many[0];
            debug!(
                "read_xlsx_table: {} worksheets, using the first: {:?}",
                many.len(),
                worksheet_name
            );
            Ok(range.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::cell_to_string;
    use calamine::DataType;

    #[test]
    fn cells_stringify_like_the_export() {
        assert_eq!(cell_to_string(&DataType::String("Yes".to_string())), "Yes");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::Int(4)), "4");
        assert_eq!(cell_to_string(&DataType::Float(5.0)), "5");
        assert_eq!(cell_to_string(&DataType::Float(3.5)), "3.5");
        assert_eq!(cell_to_string(&DataType::Bool(true)), "true");
    }
}
