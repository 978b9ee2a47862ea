use clap::Parser;
use log::info;
use snafu::ErrorCompat;

mod args;
mod report;

use crate::args::Args;

fn main() {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!("args: {:?}", args);

    if let Err(e) = report::run_report(&args) {
        eprintln!("An error occurred: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
