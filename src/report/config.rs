// The JSON configuration file and its merge with the command-line flags.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;
use std::path::PathBuf;

use survey_report::ReportOptions;

use crate::args::Args;
use crate::report::{CliResult, MissingInputSnafu, OpeningJsonSnafu, ParsingJsonSnafu};

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportTitle")]
    pub report_title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(rename = "ignoreHeadersExact")]
    pub ignore_headers_exact: Option<Vec<String>>,
    #[serde(rename = "ignoreHeadersContain")]
    pub ignore_headers_contain: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderingSettings {
    #[serde(rename = "freeTextThreshold")]
    pub free_text_threshold: Option<usize>,
    #[serde(rename = "maxDisplayedAnswers")]
    pub max_displayed_answers: Option<usize>,
    #[serde(rename = "maxAnswerLength")]
    pub max_answer_length: Option<usize>,
    #[serde(rename = "fontPath")]
    pub font_path: Option<String>,
}

/// Every field is optional: an empty file is a valid configuration and the
/// defaults take over.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub rendering: RenderingSettings,
}

pub fn read_config(path: &str) -> CliResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config = serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// Everything one run needs, after the command-line flags have been merged
/// over the configuration file.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub options: ReportOptions,
    pub input: String,
    pub provider: String,
    pub worksheet: Option<String>,
    pub out: String,
    pub summary_path: Option<String>,
}

pub fn resolve_plan(config: &ReportConfig, args: &Args) -> CliResult<RunPlan> {
    let input = args
        .input
        .clone()
        .or_else(|| config.source.file_path.clone())
        .context(MissingInputSnafu {})?;
    let provider = args
        .input_type
        .clone()
        .or_else(|| config.source.provider.clone())
        .unwrap_or_else(|| {
            if input.to_lowercase().ends_with(".xlsx") {
                "xlsx".to_string()
            } else {
                "csv".to_string()
            }
        });

    let mut options = ReportOptions::default();
    if let Some(title) = &config.output_settings.report_title {
        options.report_title = title.clone();
    }
    if let Some(exact) = &config.filters.ignore_headers_exact {
        options.ignore_exact = exact.clone();
    }
    if let Some(contains) = &config.filters.ignore_headers_contain {
        options.ignore_contains = contains.clone();
    }
    if let Some(threshold) = config.rendering.free_text_threshold {
        options.free_text_threshold = threshold.max(1);
    }
    if let Some(max_answers) = config.rendering.max_displayed_answers {
        options.max_display_answers = max_answers;
    }
    if let Some(max_length) = config.rendering.max_answer_length {
        options.max_answer_length = max_length;
    }
    if let Some(font) = &config.rendering.font_path {
        options.font_path = Some(PathBuf::from(font));
    }

    let out = args
        .out
        .clone()
        .or_else(|| config.output_settings.output_path.clone())
        .unwrap_or_else(|| "survey_report.pdf".to_string());
    let worksheet = args
        .excel_worksheet_name
        .clone()
        .or_else(|| config.source.worksheet_name.clone());
    let summary_path = args
        .summary
        .clone()
        .or_else(|| config.output_settings.summary_path.clone());

    Ok(RunPlan {
        options,
        input,
        provider,
        worksheet,
        out,
        summary_path,
    })
}
