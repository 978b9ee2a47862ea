// ********* Options for one report generation run ***********

use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;

/// Substrings of column headers that are metadata added by form tools rather
/// than survey questions. Matched case-insensitively.
pub const DEFAULT_IGNORED_CONTAINS: [&str; 17] = [
    "submission id",
    "submit date",
    "start date",
    "end date",
    "ip address",
    "network id",
    "tags",
    "user agent",
    "fillout_account_id",
    "submission_edit_link",
    "timestamp",
    "status",
    "url",
    "error",
    "current step",
    "last updated",
    "submission started",
];

/// Everything that shapes a single report. Read-only for the duration of a
/// run; the defaults can be overridden field by field.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Title shown in the running header band of every page.
    pub report_title: String,
    /// Headers equal to one of these entries are skipped (case-insensitive).
    pub ignore_exact: Vec<String>,
    /// Headers containing one of these substrings are skipped (case-insensitive).
    pub ignore_contains: Vec<String>,
    /// Above this many distinct answers a question is listed instead of charted.
    pub free_text_threshold: usize,
    /// Cap on the number of listed answers per free-text question.
    pub max_display_answers: usize,
    /// Listed answers longer than this many characters are cut with an ellipsis.
    pub max_answer_length: usize,
    /// TTF file embedded into the document. Without it the built-in Helvetica
    /// is used, which covers Latin text only.
    pub font_path: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> ReportOptions {
        ReportOptions {
            report_title: "Survey Results Report".to_string(),
            ignore_exact: Vec::new(),
            ignore_contains: DEFAULT_IGNORED_CONTAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            free_text_threshold: 15,
            max_display_answers: 100,
            max_answer_length: 200,
            font_path: None,
        }
    }
}

/// Errors that prevent a report from being generated. A failed run never
/// leaves partial output behind.
#[derive(Debug)]
pub enum ReportError {
    /// Every column of the table was filtered out, so there is nothing to
    /// report on. Raised before any rendering starts.
    NoReportableColumns,
    FontLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    FontParse {
        path: PathBuf,
    },
    Chart(String),
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::NoReportableColumns => {
                write!(f, "no reportable columns left after filtering")
            }
            ReportError::FontLoad { path, .. } => {
                write!(f, "could not read the font file {:?}", path)
            }
            ReportError::FontParse { path } => {
                write!(f, "{:?} is not a usable TrueType font", path)
            }
            ReportError::Chart(msg) => write!(f, "chart rendering failed: {}", msg),
            ReportError::WriteOutput { path, .. } => {
                write!(f, "could not write the document to {:?}", path)
            }
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReportError::FontLoad { source, .. } => Some(source),
            ReportError::WriteOutput { source, .. } => Some(source),
            _ => None,
        }
    }
}
