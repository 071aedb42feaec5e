//! Python Module Statistics Tool
//!
//! Parses Python modules with a pure indentation scan, recovering top-level
//! functions, classes and their direct methods, computes per-block and
//! per-module statistics, and writes them to a Markdown report.
//!
//! Input is either a list of files or a single package directory, whose
//! Python files are discovered depth-first in name order.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser};
use colored::*;

use pystats::codeblock::BlockParser;
use pystats::error::Result;
use pystats::module::parse_modules;
use pystats::package::{compile_filespec, PackageTree, WalkOptions};
use pystats::progress::RunLog;
use pystats::report::{ReportKind, StatsByModule};
use pystats::statistic::{compute_all, StatKind};

/// Default output filename, without extension.
const OUTPUT_FILENAME_BASE: &str = "out";

fn stat_names() -> PossibleValuesParser {
    PossibleValuesParser::new(StatKind::ALL.map(StatKind::name))
}

fn report_names() -> PossibleValuesParser {
    PossibleValuesParser::new(ReportKind::ALL.map(ReportKind::name))
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Statistics and Markdown reports for Python modules",
    long_about = "Parses Python files (or a package directory) by indentation, \
                  extracting functions, classes and methods, and writes a Markdown report \
                  of line counts, method counts and missing docstrings."
)]
struct Args {
    /// The input Python file(s), or a single package directory.
    #[arg(required = true, num_args = 1.., value_name = "FILENAME")]
    input: Vec<PathBuf>,

    /// Include only the specified stats (default: all stats).
    #[arg(short, long, num_args = 1.., value_parser = stat_names())]
    stats: Vec<String>,

    /// Generate only the specified reports (default: all reports).
    #[arg(short, long, num_args = 1.., value_parser = report_names())]
    reports: Vec<String>,

    /// Output filename, without extension.
    #[arg(short, long, default_value = OUTPUT_FILENAME_BASE)]
    output: String,

    /// Silence progress output.
    #[arg(short = 'q', long)]
    silent: bool,

    /// Glob a discovered file must match to be analyzed.
    #[arg(short = 'f', long, default_value = "*.py")]
    filespec: String,

    /// Directory name to skip during package discovery (repeatable).
    #[arg(short, long, action = ArgAction::Append)]
    ignore: Vec<String>,

    #[arg(short = 'd', long, default_value = "100")]
    max_depth: usize,

    /// Width in spaces of one indentation level.
    #[arg(long, default_value = "4")]
    indent_width: usize,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    match run_with_args(env::args_os()) {
        Ok(()) => {
            println!("DONE.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = Args::parse_from(args);
    let mut log = RunLog::new(!args.silent);
    run(&args, &mut log)
}

/// Files to analyze: a single directory expands to its discovered sources,
/// anything else is taken as a list of files. The second value is the
/// rendered package tree, empty for file lists.
fn resolve_inputs(args: &Args, log: &mut RunLog) -> Result<(Vec<PathBuf>, Vec<String>)> {
    match args.input.as_slice() {
        [root] if root.is_dir() => {
            let options = WalkOptions {
                ignore: args.ignore.clone(),
                max_depth: args.max_depth,
                filespec: Some(compile_filespec(&args.filespec)?),
            };
            let tree = PackageTree::discover(root, &options, log)?;
            log.info(&format!("Discovered package \"{}\"", tree.root().display()));
            Ok((tree.source_files(), tree.render()))
        }
        files => Ok((files.to_vec(), Vec::new())),
    }
}

fn run(args: &Args, log: &mut RunLog) -> Result<()> {
    let (files, layout) = resolve_inputs(args, log)?;
    let parser = BlockParser::with_width(args.indent_width);

    // 1. Parse
    let modules = parse_modules(&files, &parser, log);
    log.info(&format!("Parsed {} Python module(s)", modules.len()));

    // 2. Compute
    let stat_kinds = StatKind::select(&args.stats);
    let stats: StatsByModule<'_> = modules
        .iter()
        .map(|module| (module, compute_all(module, &stat_kinds)))
        .collect();

    // 3. Report
    for kind in ReportKind::select(&args.reports) {
        let report = kind.report();
        match report.write(&modules, &stats, &layout, &args.output) {
            Ok(path) => log.report_saved(report.name(), &path),
            Err(err) => {
                log::debug!("{}", err);
                log.report_failed(report.name(), &err);
            }
        }
    }

    log.print_summary();
    Ok(())
}
