//! Report rendering.
//!
//! A report walks the parsed modules in input order and prints, for each,
//! its module observations, its classes (methods sorted by signature) and
//! its top-level functions (sorted by signature):
//!
//! ```text
//! # `pystats` Report
//! **Num Modules:** 1
//!
//! ---
//!
//! ## module: shapes
//! - **Num Module Lines:** 12
//! ### Classes
//! #### `class Shape`
//! - **Num Class Lines:** 9
//! **Methods.**
//! - `area(self)`
//!     - **Num Method Lines:** 4
//! ### Functions
//! - No Function
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::codeblock::CodeBlock;
use crate::error::{PystatsError, Result};
use crate::module::Module;
use crate::statistic::Statistic;

/// Statistics per module, each list in the order the kinds were requested.
pub type StatsByModule<'m> = HashMap<&'m Module, Vec<Statistic<'m>>>;

pub trait Report {
    fn name(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    /// `layout` holds the rendered package tree, empty when the input was a
    /// list of files.
    fn render(&self, modules: &[Module], stats: &StatsByModule<'_>, layout: &[String]) -> String;

    /// Renders and writes `filename_base` + extension, returning the path.
    fn write(
        &self,
        modules: &[Module],
        stats: &StatsByModule<'_>,
        layout: &[String],
        filename_base: &str,
    ) -> Result<PathBuf> {
        let path = PathBuf::from(format!("{}{}", filename_base, self.file_extension()));
        let output = self.render(modules, stats, layout);
        fs::write(&path, output).map_err(|source| PystatsError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Markdown,
}

impl ReportKind {
    pub const ALL: [ReportKind; 1] = [ReportKind::Markdown];

    pub fn name(self) -> &'static str {
        self.report().name()
    }

    pub fn report(self) -> &'static dyn Report {
        match self {
            ReportKind::Markdown => &MarkdownReport,
        }
    }

    /// Registered kinds named in `names`, in registry order; all when empty.
    pub fn select<S: AsRef<str>>(names: &[S]) -> Vec<ReportKind> {
        if names.is_empty() {
            return ReportKind::ALL.to_vec();
        }
        ReportKind::ALL
            .into_iter()
            .filter(|kind| names.iter().any(|name| name.as_ref() == kind.name()))
            .collect()
    }
}

pub struct MarkdownReport;

fn statistics_for<'a, 'm>(stats: &'a StatsByModule<'m>, module: &Module) -> &'a [Statistic<'m>] {
    stats.get(module).map(Vec::as_slice).unwrap_or(&[])
}

fn sorted_by_signature(blocks: &[CodeBlock]) -> Vec<&CodeBlock> {
    let mut sorted: Vec<&CodeBlock> = blocks.iter().collect();
    sorted.sort_by(|a, b| a.signature.cmp(&b.signature));
    sorted
}

fn push_block_stats(out: &mut Vec<String>, stats: &[Statistic<'_>], block: &CodeBlock) {
    out.push(format!("- `{}`", block.signature));
    for stat in stats {
        for observation in stat.function_stats(block) {
            out.push(format!("    - {}", observation));
        }
    }
}

impl MarkdownReport {
    fn render_module(out: &mut Vec<String>, module: &Module, stats: &[Statistic<'_>]) {
        out.push("\n---\n".to_string());
        out.push(format!("## module: {}", module.name));
        for stat in stats {
            for observation in stat.module_stats() {
                out.push(format!("- {}", observation));
            }
        }

        out.push("### Classes".to_string());
        if module.classes.is_empty() {
            out.push("- No Class".to_string());
        }
        for class_block in &module.classes {
            out.push(format!("#### `class {}`", class_block.signature));
            for stat in stats {
                for observation in stat.class_stats(class_block) {
                    out.push(format!("- {}", observation));
                }
            }
            out.push("**Methods.**".to_string());
            for method_block in sorted_by_signature(module.methods_of(class_block)) {
                push_block_stats(out, stats, method_block);
            }
        }

        out.push("### Functions".to_string());
        if module.functions.is_empty() {
            out.push("- No Function".to_string());
        }
        for func_block in sorted_by_signature(&module.functions) {
            push_block_stats(out, stats, func_block);
        }
    }

    fn render_package(
        out: &mut Vec<String>,
        modules: &[Module],
        stats: &StatsByModule<'_>,
        layout: &[String],
    ) {
        let mut observations = Vec::new();
        for module in modules {
            for stat in statistics_for(stats, module) {
                for observation in stat.package_stats() {
                    observations.push(format!("- `{}`: {}", module.name, observation));
                }
            }
        }
        if observations.is_empty() && layout.is_empty() {
            return;
        }

        out.push("\n---\n".to_string());
        out.push("## package".to_string());
        out.extend(observations);
        if !layout.is_empty() {
            out.push("### Layout".to_string());
            out.push("```text".to_string());
            out.extend(layout.iter().cloned());
            out.push("```".to_string());
        }
    }
}

impl Report for MarkdownReport {
    fn name(&self) -> &'static str {
        "MarkdownReport"
    }

    fn file_extension(&self) -> &'static str {
        ".md"
    }

    fn render(&self, modules: &[Module], stats: &StatsByModule<'_>, layout: &[String]) -> String {
        let mut out = vec![
            "# `pystats` Report".to_string(),
            format!("**Num Modules:** {}", modules.len()),
        ];
        for module in modules {
            MarkdownReport::render_module(&mut out, module, statistics_for(stats, module));
        }
        MarkdownReport::render_package(&mut out, modules, stats, layout);

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}
