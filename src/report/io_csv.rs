// Primitives for reading CSV survey exports.

use std::fs::File;
use std::io::Read;

use log::debug;
use snafu::prelude::*;

use survey_report::{Column, Table};

use crate::report::{CliResult, CsvRowSnafu, EmptyTableSnafu, OpeningCsvSnafu};

pub fn read_csv_table(path: &str) -> CliResult<Table> {
    let rdr: csv::Reader<File> = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    read_table(rdr, path)
}

/// The first record is the header row; every following record contributes
/// one cell per column, blank-padded when the row is short.
fn read_table<R: Read>(rdr: csv::Reader<R>, path: &str) -> CliResult<Table> {
    let mut records = rdr.into_records();
    let header = match records.next() {
        Some(record) => record.context(CsvRowSnafu { path })?,
        None => return EmptyTableSnafu { path }.fail(),
    };
    let mut columns: Vec<Column> = header
        .iter()
        .map(|h| Column {
            header: h.to_string(),
            cells: Vec::new(),
        })
        .collect();
    debug!(
        "header: {:?}",
        columns.iter().map(|c| &c.header).collect::<Vec<_>>()
    );

    for (idx, record) in records.enumerate() {
        let record = record.context(CsvRowSnafu { path })?;
        debug!("row {}: {} cells", idx + 1, record.len());
        for (col, column) in columns.iter_mut().enumerate() {
            column.cells.push(record.get(col).unwrap_or("").to_string());
        }
    }
    Ok(Table { columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_from(data: &str) -> Table {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_bytes());
        read_table(rdr, "test.csv").expect("table should parse")
    }

    #[test]
    fn header_and_cells_stay_aligned() {
        let table = table_from("name,color\nalice,red\nbob,blue\n");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].header, "name");
        assert_eq!(table.columns[1].cells, vec!["red", "blue"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn short_rows_are_padded_with_blanks() {
        let table = table_from("a,b,c\n1,2\n4,5,6\n");
        assert_eq!(table.columns[2].cells, vec!["", "6"]);
    }

    #[test]
    fn non_ascii_text_round_trips() {
        let table = table_from("満足度\nとても満足\n");
        assert_eq!(table.columns[0].header, "満足度");
        assert_eq!(table.columns[0].cells, vec!["とても満足"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("".as_bytes());
        assert!(read_table(rdr, "empty.csv").is_err());
    }
}
