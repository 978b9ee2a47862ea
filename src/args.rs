use clap::Parser;

/// Generates a paginated PDF report out of a tabular survey export.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) JSON description of the report: input source, ignored
    /// columns, rendering limits and output settings. Command-line flags override
    /// the values given in the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The survey export to read. Overrides the path that may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path or 'stdout') Where the PDF document is written. Setting this
    /// option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) If specified, a JSON summary of the run (the processed
    /// questions with their classification and counts) is written to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path, optional) A reference summary in JSON format. If provided,
    /// svreport checks that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// When reading an Excel file, the name of the worksheet holding the answers.
    /// Defaults to the only worksheet of the workbook.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
