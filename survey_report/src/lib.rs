//! Turns a tabular survey export (one row per respondent, one column per
//! question) into a paginated PDF report. Questions with a bounded set of
//! answers become pie charts; open-ended questions become bulleted listings
//! of the distinct answers.
//!
//! The pipeline is strictly sequential: filter the columns, classify each
//! one from its answer cardinality, aggregate or deduplicate, and hand the
//! blocks to the layout engine in the original column order. Page placement
//! is stateful, so there is exactly one writer to the document at any time.

mod chart;
mod config;
mod filter;
mod fonts;
mod layout;
mod pdf;
mod tally;

pub use crate::chart::{
    wedge_layout, ChartRenderer, PieChartRenderer, RasterImage, WedgeSpec, WEDGE_COLORS,
};
pub use crate::config::{ReportError, ReportOptions, DEFAULT_IGNORED_CONTAINS};
pub use crate::filter::should_ignore;
pub use crate::fonts::{DocumentFont, EmbeddedFont, GlyphMetrics};
pub use crate::layout::{
    clip_answer, wrap_text, LayoutCursor, PageSurface, Rect, ReportComposer, Rgb,
};
pub use crate::pdf::PdfSurface;
pub use crate::tally::{classify, dedup_in_order, value_counts, QuestionKind, ValueCounts};

use std::fs;
use std::path::Path;

use log::{debug, info};

/// One survey column: the question header and the raw cell values, aligned
/// by respondent row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Column {
    pub header: String,
    pub cells: Vec<String>,
}

/// The loaded survey export. Immutable once built by a reader.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }
}

/// What the driver decided and rendered for one question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionSummary {
    pub header: String,
    pub kind: QuestionKind,
    pub responses: u64,
    pub unique: usize,
}

/// The record of one run: the processed questions in render order plus the
/// resulting page count. Identical input and options produce an identical
/// summary.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunSummary {
    pub questions: Vec<QuestionSummary>,
    pub pages: u32,
}

impl RunSummary {
    pub fn processed_questions(&self) -> usize {
        self.questions.len()
    }
}

pub struct ReportOutput {
    /// The finished document.
    pub pdf: Vec<u8>,
    pub summary: RunSummary,
}

/// Runs the report over injected backends. This is the whole driver; the
/// convenience entry points below couple it to the real PDF surface and
/// chart renderer.
pub fn render_report(
    table: &Table,
    options: &ReportOptions,
    surface: &mut dyn PageSurface,
    charts: &dyn ChartRenderer,
) -> Result<RunSummary, ReportError> {
    let reportable = table
        .columns
        .iter()
        .filter(|c| !should_ignore(&c.header, &options.ignore_exact, &options.ignore_contains))
        .count();
    if reportable == 0 {
        return Err(ReportError::NoReportableColumns);
    }
    info!(
        "building report over {} of {} columns",
        reportable,
        table.columns.len()
    );

    let mut composer = ReportComposer::new(surface, &options.report_title);
    let mut questions: Vec<QuestionSummary> = Vec::new();
    for column in &table.columns {
        if should_ignore(&column.header, &options.ignore_exact, &options.ignore_contains) {
            debug!("ignored column: {:?}", column.header);
            continue;
        }
        let answers: Vec<&str> = column
            .cells
            .iter()
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .collect();
        if answers.is_empty() {
            info!("no answers, skipping column: {:?}", column.header);
            continue;
        }

        let counts = value_counts(&answers);
        let kind = classify(counts.total, counts.unique(), options.free_text_threshold);
        debug!(
            "column {:?}: {} answers, {} unique -> {:?}",
            column.header,
            counts.total,
            counts.unique(),
            kind
        );

        composer.question_banner(&column.header, kind);
        match kind {
            QuestionKind::Chart => {
                let image = charts.render_pie(&counts)?;
                composer.chart_image(&image);
            }
            QuestionKind::FreeText => {
                let unique = dedup_in_order(&answers);
                composer.answer_list(
                    &unique,
                    options.max_display_answers,
                    options.max_answer_length,
                );
            }
        }
        questions.push(QuestionSummary {
            header: column.header.clone(),
            kind,
            responses: counts.total,
            unique: counts.unique(),
        });
    }

    let summary = RunSummary {
        pages: composer.page_count(),
        questions,
    };
    info!(
        "report ready: {} questions over {} pages",
        summary.questions.len(),
        summary.pages
    );
    Ok(summary)
}

/// Generates the report with the real backends and returns the document as
/// an in-memory buffer, for callers that stream it onward.
pub fn generate_report(
    table: &Table,
    options: &ReportOptions,
) -> Result<ReportOutput, ReportError> {
    let font = match &options.font_path {
        Some(path) => DocumentFont::load(path)?,
        None => DocumentFont::Builtin,
    };
    let mut surface = PdfSurface::new(font);
    let charts = PieChartRenderer::default();
    let summary = render_report(table, options, &mut surface, &charts)?;
    Ok(ReportOutput {
        pdf: surface.finish(),
        summary,
    })
}

/// Generates the report and writes it to `path`.
pub fn write_report(
    table: &Table,
    options: &ReportOptions,
    path: &Path,
) -> Result<RunSummary, ReportError> {
    let output = generate_report(table, options)?;
    fs::write(path, &output.pdf).map_err(|source| ReportError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(output.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::testing::RecordingSurface;

    struct FakeCharts;

    impl ChartRenderer for FakeCharts {
        fn render_pie(&self, _counts: &ValueCounts) -> Result<RasterImage, ReportError> {
            Ok(RasterImage {
                width: 10,
                height: 6,
                pixels: vec![255; 180],
            })
        }
    }

    fn column(header: &str, cells: &[&str]) -> Column {
        Column {
            header: header.to_string(),
            cells: cells.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sample_table() -> Table {
        Table {
            columns: vec![
                column("Submission ID", &["1", "2", "3", "4", "5"]),
                column(
                    "How satisfied are you?",
                    &["Good", "Good", "Bad", "Good", "Okay", "Bad", "Good", "Good"],
                ),
                column("Comments", &["", "  ", "", "", "", "", "", ""]),
                column(
                    "Anything else?",
                    &["loved it", "", "too long", "loved it", "", "", "", ""],
                ),
            ],
        }
    }

    fn run(table: &Table, options: &ReportOptions) -> (RunSummary, RecordingSurface) {
        let mut surface = RecordingSurface::new(0.5);
        let summary =
            render_report(table, options, &mut surface, &FakeCharts).expect("report should run");
        (summary, surface)
    }

    #[test]
    fn columns_render_once_in_original_order() {
        let table = sample_table();
        let (summary, _) = run(&table, &ReportOptions::default());
        let headers: Vec<&str> = summary.questions.iter().map(|q| q.header.as_str()).collect();
        // The ID column is filtered, the all-blank column is skipped.
        assert_eq!(headers, vec!["How satisfied are you?", "Anything else?"]);
        assert_eq!(summary.processed_questions(), 2);
    }

    #[test]
    fn classification_feeds_the_right_renderer() {
        let table = sample_table();
        let (summary, surface) = run(&table, &ReportOptions::default());
        assert_eq!(summary.questions[0].kind, QuestionKind::Chart);
        assert_eq!(summary.questions[0].responses, 8);
        assert_eq!(summary.questions[0].unique, 3);
        // total=3 answers is below the small-sample floor.
        assert_eq!(summary.questions[1].kind, QuestionKind::FreeText);
        let images = surface
            .calls
            .iter()
            .filter(|c| matches!(c, crate::layout::testing::Call::Image))
            .count();
        assert_eq!(images, 1);
    }

    #[test]
    fn free_text_answers_are_deduplicated() {
        let table = Table {
            columns: vec![column("Feedback", &["hello", "hello", "world"])],
        };
        let (summary, surface) = run(&table, &ReportOptions::default());
        assert_eq!(summary.questions[0].kind, QuestionKind::FreeText);
        let texts = surface.texts();
        assert_eq!(texts.iter().filter(|&&t| t == "\u{2022} hello").count(), 1);
        assert_eq!(texts.iter().filter(|&&t| t == "\u{2022} world").count(), 1);
    }

    #[test]
    fn fully_filtered_table_is_refused_before_rendering() {
        let table = Table {
            columns: vec![
                column("Submission ID", &["1"]),
                column("Submit Date (UTC)", &["2024-01-01"]),
            ],
        };
        let mut surface = RecordingSurface::new(0.5);
        let err = render_report(
            &table,
            &ReportOptions::default(),
            &mut surface,
            &FakeCharts,
        )
        .expect_err("nothing reportable");
        assert!(matches!(err, ReportError::NoReportableColumns));
        // Refused up front: not even the first page was started.
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn blank_columns_produce_an_empty_report_not_an_error() {
        let table = Table {
            columns: vec![column("Feedback", &["", "  ", ""])],
        };
        let (summary, _) = run(&table, &ReportOptions::default());
        assert_eq!(summary.processed_questions(), 0);
        assert_eq!(summary.pages, 1);
    }

    #[test]
    fn identical_runs_produce_identical_summaries() {
        let table = sample_table();
        let options = ReportOptions::default();
        let (first, _) = run(&table, &options);
        let (second, _) = run(&table, &options);
        assert_eq!(first, second);
    }

    #[test]
    fn exact_ignore_list_is_honored() {
        let table = sample_table();
        let mut options = ReportOptions::default();
        options.ignore_exact = vec!["How satisfied are you?".to_string()];
        let (summary, _) = run(&table, &options);
        let headers: Vec<&str> = summary.questions.iter().map(|q| q.header.as_str()).collect();
        assert_eq!(headers, vec!["Anything else?"]);
    }

    #[test]
    fn generated_document_is_a_pdf_buffer() {
        let table = sample_table();
        // Keep the chart renderer out of it: list everything.
        let mut options = ReportOptions::default();
        options.free_text_threshold = 1;
        let output = generate_report(&table, &options).expect("report should build");
        assert!(output.pdf.starts_with(b"%PDF-"));
        assert_eq!(output.summary.processed_questions(), 2);
        assert_eq!(output.summary.questions[0].kind, QuestionKind::FreeText);
    }
}
