//! Indentation-based statistics for Python modules.
//!
//! [`codeblock`] recovers functions, classes and methods from raw lines,
//! [`module`] parses whole files with it, [`statistic`] computes observations
//! over a parsed module and [`report`] renders them as Markdown.

pub mod codeblock;
pub mod error;
pub mod module;
pub mod package;
pub mod progress;
pub mod report;
pub mod statistic;
