// Orchestration of one report run: merge the configuration with the
// command-line flags, load the table, run the engine and write the outputs.

use log::{info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::Write;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_report::{generate_report, QuestionKind, RunSummary, Table};

use crate::args::Args;
use crate::report::config::resolve_plan;

pub mod config;
pub mod io_csv;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Could not open the input file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Malformed row in {path}"))]
    CsvRow { source: csv::Error, path: String },
    #[snafu(display("The input file {path} has no header row"))]
    EmptyTable { path: String },
    #[snafu(display("Error opening the workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no usable worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Could not read {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not parse {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not serialize the run summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("No input file: pass --input or set source.filePath in the configuration"))]
    MissingInput {},
    #[snafu(display("Unknown input type {provider:?}: expected csv or xlsx"))]
    UnknownProvider { provider: String },
    #[snafu(display("Report generation failed"))]
    Engine { source: survey_report::ReportError },
    #[snafu(display("Could not write to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The computed summary differs from the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type CliResult<T> = Result<T, CliError>;

pub fn run_report(args: &Args) -> CliResult<()> {
    let file_config = match &args.config {
        Some(path) => config::read_config(path)?,
        None => config::ReportConfig::default(),
    };
    let plan = resolve_plan(&file_config, args)?;

    info!(
        "Reading survey table from {:?} ({})",
        plan.input, plan.provider
    );
    let table: Table = match plan.provider.as_str() {
        "csv" => io_csv::read_csv_table(&plan.input)?,
        "xlsx" => io_xlsx::read_xlsx_table(&plan.input, plan.worksheet.as_deref())?,
        other => return UnknownProviderSnafu { provider: other }.fail(),
    };
    info!(
        "Loaded {} rows and {} columns",
        table.row_count(),
        table.columns.len()
    );

    let output = generate_report(&table, &plan.options).context(EngineSnafu {})?;
    write_document(&plan.out, &output.pdf)?;
    info!(
        "Report written to {:?}: {} questions over {} pages",
        plan.out,
        output.summary.processed_questions(),
        output.summary.pages
    );

    let summary_js = summary_to_json(&plan.options.report_title, &output.summary);
    let pretty_summary =
        serde_json::to_string_pretty(&summary_js).context(SerializingSummarySnafu {})?;
    if let Some(summary_path) = &plan.summary_path {
        fs::write(summary_path, pretty_summary.as_bytes())
            .context(WritingOutputSnafu { path: summary_path })?;
        info!("Summary written to {:?}", summary_path);
    }

    // The reference summary, if provided for comparison.
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_summary)?;
    }

    Ok(())
}

fn write_document(out: &str, bytes: &[u8]) -> CliResult<()> {
    if out == "stdout" {
        std::io::stdout()
            .write_all(bytes)
            .context(WritingOutputSnafu { path: out })?;
    } else {
        fs::write(out, bytes).context(WritingOutputSnafu { path: out })?;
    }
    Ok(())
}

fn kind_label(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::Chart => "chart",
        QuestionKind::FreeText => "freeText",
    }
}

fn summary_to_json(title: &str, summary: &RunSummary) -> JSValue {
    let questions: Vec<JSValue> = summary
        .questions
        .iter()
        .map(|q| {
            json!({
                "header": q.header,
                "kind": kind_label(q.kind),
                "responses": q.responses,
                "unique": q.unique,
            })
        })
        .collect();
    json!({
        "reportTitle": title,
        "processedQuestions": summary.questions.len(),
        "pages": summary.pages,
        "questions": questions,
    })
}

fn check_reference(path: &str, computed_pretty: &str) -> CliResult<()> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    let reference_pretty =
        serde_json::to_string_pretty(&reference).context(SerializingSummarySnafu {})?;
    if reference_pretty != computed_pretty {
        warn!("Found differences with the reference summary");
        print_diff(reference_pretty.as_str(), computed_pretty, "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    Ok(())
}
