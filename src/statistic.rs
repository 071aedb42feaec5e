//! Statistics computed over one parsed module.
//!
//! Each `StatKind` produces one `Statistic`: free-text observations attached
//! to the module, its classes, its functions and methods, or the package
//! around it. A `Statistic` borrows the blocks it describes from the module
//! and is never changed after `compute` returns.

use std::collections::HashMap;

use crate::codeblock::CodeBlock;
use crate::module::Module;

pub const NO_DOCSTRING_WARNING: &str = "**WARNING:** Missing docstring.";

/// Openers accepted at the start of a docstring line.
const DOCSTRING_OPENERS: [&str; 4] = ["\"\"\"", "'''", "\"", "'"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    NumModuleLines,
    NumFuncLines,
    NumMethodLines,
    NumClassLines,
    WarnNoDocstring,
    NumDunderFiles,
}

impl StatKind {
    /// Registry order; also the order statistics appear in reports.
    pub const ALL: [StatKind; 6] = [
        StatKind::NumModuleLines,
        StatKind::NumFuncLines,
        StatKind::NumMethodLines,
        StatKind::NumClassLines,
        StatKind::WarnNoDocstring,
        StatKind::NumDunderFiles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatKind::NumModuleLines => "NumModuleLines",
            StatKind::NumFuncLines => "NumFuncLines",
            StatKind::NumMethodLines => "NumMethodLines",
            StatKind::NumClassLines => "NumClassLines",
            StatKind::WarnNoDocstring => "WarnNoDocstring",
            StatKind::NumDunderFiles => "NumDunderFiles",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        StatKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Registered kinds whose names appear in `names`, in registry order.
    /// An empty selection means every kind; unknown names are ignored.
    pub fn select<S: AsRef<str>>(names: &[S]) -> Vec<StatKind> {
        if names.is_empty() {
            return StatKind::ALL.to_vec();
        }
        let requested: Vec<StatKind> = names
            .iter()
            .filter_map(|name| StatKind::from_name(name.as_ref()))
            .collect();
        StatKind::ALL
            .into_iter()
            .filter(|kind| requested.contains(kind))
            .collect()
    }

    pub fn compute(self, module: &Module) -> Statistic<'_> {
        let mut stat = Statistic::default();
        match self {
            StatKind::NumModuleLines => num_module_lines(module, &mut stat),
            StatKind::NumFuncLines => num_func_lines(module, &mut stat),
            StatKind::NumMethodLines => num_method_lines(module, &mut stat),
            StatKind::NumClassLines => num_class_lines(module, &mut stat),
            StatKind::WarnNoDocstring => warn_no_docstring(module, &mut stat),
            StatKind::NumDunderFiles => num_dunder_files(module, &mut stat),
        }
        stat
    }
}

/// Observations produced by one `StatKind` over one module.
#[derive(Debug, Clone, Default)]
pub struct Statistic<'m> {
    module_stats: Vec<String>,
    function_stats: HashMap<&'m CodeBlock, Vec<String>>,
    class_stats: HashMap<&'m CodeBlock, Vec<String>>,
    package_stats: Vec<String>,
}

impl<'m> Statistic<'m> {
    pub fn module_stats(&self) -> &[String] {
        &self.module_stats
    }

    /// Observations for a function or method; empty when there are none.
    pub fn function_stats(&self, block: &CodeBlock) -> &[String] {
        self.function_stats
            .get(block)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn class_stats(&self, block: &CodeBlock) -> &[String] {
        self.class_stats
            .get(block)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn package_stats(&self) -> &[String] {
        &self.package_stats
    }

    fn add_module(&mut self, observation: String) {
        self.module_stats.push(observation);
    }

    fn add_function(&mut self, block: &'m CodeBlock, observation: String) {
        let observations = self.function_stats.entry(block).or_default();
        observations.push(observation);
    }

    fn add_class(&mut self, block: &'m CodeBlock, observation: String) {
        let observations = self.class_stats.entry(block).or_default();
        observations.push(observation);
    }

    fn add_package(&mut self, observation: String) {
        self.package_stats.push(observation);
    }
}

/// Every (class, method) pair of the module, classes in source order.
fn methods(module: &Module) -> impl Iterator<Item = &CodeBlock> {
    module
        .classes
        .iter()
        .flat_map(move |class_block| module.methods_of(class_block))
}

fn num_module_lines(module: &Module, stat: &mut Statistic<'_>) {
    let count = module.lines.len();
    stat.add_module(format!("**Num Module Lines:** {}", count));
}

fn num_func_lines<'m>(module: &'m Module, stat: &mut Statistic<'m>) {
    for func_block in &module.functions {
        let count = func_block.len();
        log::debug!("{}: {} lines", func_block.signature, count);
        stat.add_function(func_block, format!("**Num Function Lines:** {}", count));
    }
}

fn num_method_lines<'m>(module: &'m Module, stat: &mut Statistic<'m>) {
    for method_block in methods(module) {
        let count = method_block.len();
        stat.add_function(method_block, format!("**Num Method Lines:** {}", count));
    }
}

fn num_class_lines<'m>(module: &'m Module, stat: &mut Statistic<'m>) {
    for class_block in &module.classes {
        let count = class_block.len();
        let num_methods = module.methods_of(class_block).len();
        stat.add_class(class_block, format!("**Num Class Lines:** {}", count));
        stat.add_class(class_block, format!("**Num Methods:** {}", num_methods));
    }
}

/// True when the line after the signature opens a string literal.
///
/// Blocks shorter than two lines have no such line and count as undocumented.
/// A docstring on the signature line itself is not recognised.
pub fn has_docstring<S: AsRef<str>>(block_lines: &[S]) -> bool {
    block_lines
        .get(1)
        .map(|line| {
            let line = line.as_ref().trim_start();
            DOCSTRING_OPENERS
                .iter()
                .any(|opener| line.starts_with(opener))
        })
        .unwrap_or(false)
}

fn warn_no_docstring<'m>(module: &'m Module, stat: &mut Statistic<'m>) {
    for block in module.functions.iter().chain(methods(module)) {
        if !has_docstring(&block.lines) {
            stat.add_function(block, NO_DOCSTRING_WARNING.to_string());
        }
    }
}

fn num_dunder_files(module: &Module, stat: &mut Statistic<'_>) {
    let dunder_files = u32::from(module.is_dunder());
    stat.add_package(format!("**Dunder Files:** {}", dunder_files));
}

/// Computes every kind in `kinds` over `module`, in the order given.
pub fn compute_all<'m>(module: &'m Module, kinds: &[StatKind]) -> Vec<Statistic<'m>> {
    kinds.iter().map(|kind| kind.compute(module)).collect()
}
