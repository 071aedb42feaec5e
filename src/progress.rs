use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use colored::*;

use crate::error::PystatsError;
use crate::module::Module;

/// Run-scoped progress log, handed to each pipeline stage.
///
/// Progress lines are only written when `verbose` is set; counters are kept
/// either way so the caller can report them.
pub struct RunLog {
    writer: Box<dyn Write + Send>,
    verbose: bool,
    start_time: Instant,
    modules_parsed: u64,
    files_skipped: u64,
    reports_written: u64,
    report_failures: u64,
}

impl RunLog {
    pub fn new(verbose: bool) -> Self {
        RunLog::with_writer(Box::new(io::stdout()), verbose)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, verbose: bool) -> Self {
        RunLog {
            writer,
            verbose,
            start_time: Instant::now(),
            modules_parsed: 0,
            files_skipped: 0,
            reports_written: 0,
            report_failures: 0,
        }
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        if !self.verbose {
            return;
        }
        let _ = writeln!(self.writer, "{}", text);
        let _ = self.writer.flush();
    }

    pub fn info(&mut self, message: &str) {
        self.line(format!("{} {}", "INFO:".bright_cyan(), message));
    }

    pub fn warning(&mut self, message: &str) {
        self.line(format!("{} {}", "WARNING:".yellow().bold(), message));
    }

    pub fn module_parsed(&mut self, module: &Module) {
        self.modules_parsed += 1;
        self.line(format!(
            "{} Parsed \"{}\" ({} lines)",
            "INFO:".bright_cyan(),
            module.filename,
            module.lines.len().to_string().bright_yellow()
        ));
    }

    pub fn file_skipped(&mut self, path: &Path, err: &PystatsError) {
        self.files_skipped += 1;
        self.line(format!(
            "{} {} - Skipped \"{}\".",
            "ERROR:".red().bold(),
            err,
            path.display()
        ));
    }

    pub fn report_saved(&mut self, report_name: &str, path: &Path) {
        self.reports_written += 1;
        self.line(format!(
            "{} Saved {} to \"{}\".",
            "INFO:".bright_cyan(),
            report_name,
            path.display()
        ));
    }

    pub fn report_failed(&mut self, report_name: &str, err: &PystatsError) {
        self.report_failures += 1;
        let label = "ERROR:".red().bold();
        self.line(format!("{} {} ({})", label, err, report_name));
    }

    pub fn modules_parsed(&self) -> u64 {
        self.modules_parsed
    }

    pub fn files_skipped(&self) -> u64 {
        self.files_skipped
    }

    pub fn reports_written(&self) -> u64 {
        self.reports_written
    }

    pub fn report_failures(&self) -> u64 {
        self.report_failures
    }

    pub fn print_summary(&mut self) {
        if !self.verbose {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let writer = &mut self.writer;
        let _ = writeln!(writer, "\n{}", "Summary:".blue().bold());
        let _ = writeln!(
            writer,
            "Total time: {} seconds",
            format!("{:.2}", elapsed).bright_yellow()
        );
        let _ = writeln!(
            writer,
            "Modules parsed: {}",
            self.modules_parsed.to_string().bright_yellow()
        );
        let _ = writeln!(
            writer,
            "Reports written: {}",
            self.reports_written.to_string().bright_yellow()
        );
        let skipped = self.files_skipped + self.report_failures;
        if skipped > 0 {
            let _ = writeln!(
                writer,
                "{}: {}",
                "Warning".red().bold(),
                skipped.to_string().bright_yellow()
            );
        }
        let _ = writer.flush();
    }
}
