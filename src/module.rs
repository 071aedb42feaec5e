//! Parsed source modules.

use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::codeblock::{BlockParser, CodeBlock};
use crate::error::{PystatsError, Result};
use crate::progress::RunLog;

/// Reads a file line by line, converting invalid UTF‑8 sequences using replacement characters.
struct LossyLineReader {
    reader: BufReader<Box<dyn Read + Send>>,
    buffer: Vec<u8>,
}

impl LossyLineReader {
    fn from_reader(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader: BufReader::new(reader),
            buffer: Vec::with_capacity(8 * 1024),
        }
    }
}

impl Iterator for LossyLineReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                let text = String::from_utf8_lossy(&self.buffer);
                let line = text.trim_end_matches(['\n', '\r']).to_string();
                Some(Ok(line))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Returns the lines of `path` without their line terminators.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let read_error = |source| PystatsError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(read_error)?;
    LossyLineReader::from_reader(Box::new(file))
        .collect::<io::Result<Vec<_>>>()
        .map_err(read_error)
}

/// Filename with its final extension removed. A leading dot in the last
/// path component is part of the name, not an extension.
fn module_name(filename: &str) -> String {
    let filename = filename.trim();
    let base_start = filename.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    match filename[base_start..].rfind('.') {
        Some(dot) if dot > 0 => filename[..base_start + dot].to_string(),
        _ => filename.to_string(),
    }
}

/// Direct methods per class, keyed by the class block.
pub type MethodMap = HashMap<CodeBlock, Vec<CodeBlock>>;

/// Splits `lines` into top-level functions, top-level classes, and the
/// direct methods of each class.
///
/// Methods are found by re-scanning each class's own lines one level deeper,
/// offset by the class start so their indices stay module-relative.
pub fn parse<S: AsRef<str>>(
    lines: &[S],
    parser: &BlockParser,
) -> (Vec<CodeBlock>, Vec<CodeBlock>, MethodMap) {
    let functions = parser.functions(lines, 0, 0);
    let classes = parser.classes(lines, 0, 0);

    let methods = classes
        .iter()
        .map(|class_block| {
            let class_methods = parser.functions(&class_block.lines, 1, class_block.start);
            (class_block.clone(), class_methods)
        })
        .collect();

    (functions, classes, methods)
}

/// One source file and the blocks found in it. Immutable once built.
#[derive(Debug, Clone)]
pub struct Module {
    pub filename: String,
    pub name: String,
    pub lines: Vec<String>,
    pub functions: Vec<CodeBlock>,
    pub classes: Vec<CodeBlock>,
    pub methods: MethodMap,
}

impl Module {
    pub fn from_lines(filename: &str, lines: Vec<String>, parser: &BlockParser) -> Self {
        let (functions, classes, methods) = parse(&lines, parser);
        log::debug!(
            "{}: {} lines, {} functions, {} classes",
            filename,
            lines.len(),
            functions.len(),
            classes.len()
        );
        Module {
            filename: filename.to_string(),
            name: module_name(filename),
            lines,
            functions,
            classes,
            methods,
        }
    }

    pub fn read(path: &Path, parser: &BlockParser) -> Result<Self> {
        let lines = read_lines(path)?;
        Ok(Module::from_lines(&path.to_string_lossy(), lines, parser))
    }

    /// Direct methods of `class_block`, in source order.
    pub fn methods_of(&self, class_block: &CodeBlock) -> &[CodeBlock] {
        self.methods
            .get(class_block)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the file name (last path component) starts with `__`.
    pub fn is_dunder(&self) -> bool {
        Path::new(&self.filename)
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("__"))
            .unwrap_or(false)
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
    }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.filename.hash(state);
    }
}

/// Reads and parses every path in parallel, keeping input order.
///
/// Unreadable files are logged and left out; they never abort the batch.
pub fn parse_modules(paths: &[PathBuf], parser: &BlockParser, log: &mut RunLog) -> Vec<Module> {
    let results: Vec<(&PathBuf, Result<Module>)> = paths
        .par_iter()
        .filter(|path| !path.as_os_str().is_empty())
        .map(|path| (path, Module::read(path, parser)))
        .collect();

    let mut modules = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(module) => {
                log.module_parsed(&module);
                modules.push(module);
            }
            Err(err) => {
                log::debug!("skipping {}: {}", path.display(), err);
                log.file_skipped(path, &err);
            }
        }
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|line| line.to_string()).collect()
    }

    fn quiet_log() -> RunLog {
        RunLog::with_writer(Box::new(io::sink()), false)
    }

    #[test]
    fn test_module_name_strips_final_extension() {
        assert_eq!(module_name("foo.py"), "foo");
        assert_eq!(module_name("pkg/foo.tar.py"), "pkg/foo.tar");
        assert_eq!(module_name("pkg.d/noext"), "pkg.d/noext");
        assert_eq!(module_name(".hidden"), ".hidden");
        assert_eq!(module_name("  spaced.py  "), "spaced");
    }

    #[test]
    fn test_parse_functions_classes_and_methods() {
        let source = lines(&[
            "import os",
            "",
            "def top(a):",
            "    return a",
            "",
            "class Shape:",
            "    \"\"\"A shape.\"\"\"",
            "    def __init__(self, sides):",
            "        self.sides = sides",
            "",
            "    def area(self):",
            "        def helper():",
            "            return 0",
            "        return helper()",
            "class Empty:",
            "    pass",
            "def last():",
            "    pass",
        ]);
        let module = Module::from_lines("shapes.py", source, &BlockParser::default());

        assert_eq!(module.name, "shapes");
        assert_eq!(
            module.functions,
            vec![
                CodeBlock::new("def", "top(a)", 2, 5),
                CodeBlock::new("def", "last()", 16, 18),
            ]
        );
        assert_eq!(
            module.classes,
            vec![
                CodeBlock::new("class", "Shape", 5, 14),
                CodeBlock::new("class", "Empty", 14, 16),
            ]
        );

        let shape_methods = module.methods_of(&module.classes[0]);
        assert_eq!(
            shape_methods,
            &[
                CodeBlock::new("def", "__init__(self, sides)", 7, 10),
                CodeBlock::new("def", "area(self)", 10, 14),
            ]
        );
        // method indices point into the module's own lines
        assert_eq!(module.lines[shape_methods[1].start], "    def area(self):");
        assert!(module.methods_of(&module.classes[1]).is_empty());
    }

    #[test]
    fn test_methods_of_unknown_class_is_empty() {
        let module = Module::from_lines("a.py", Vec::new(), &BlockParser::default());
        assert!(module.methods_of(&CodeBlock::default()).is_empty());
        assert!(module.lines.is_empty());
        assert!(module.functions.is_empty());
    }

    #[test]
    fn test_is_dunder_uses_last_component() {
        let parser = BlockParser::default();
        assert!(Module::from_lines("pkg/__init__.py", Vec::new(), &parser).is_dunder());
        assert!(Module::from_lines("__main__.py", Vec::new(), &parser).is_dunder());
        assert!(!Module::from_lines("__pkg__/mod.py", Vec::new(), &parser).is_dunder());
    }

    #[test]
    fn test_modules_compare_by_filename() {
        let parser = BlockParser::default();
        let a = Module::from_lines("a.py", lines(&["x = 1"]), &parser);
        let b = Module::from_lines("a.py", lines(&["y = 2", "z = 3"]), &parser);
        let mut map = HashMap::new();
        map.insert(&a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_read_lines_strips_terminators_and_replaces_invalid_utf8() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("mixed.py");
        let mut file = fs::File::create(&path)?;
        file.write_all(b"def f():\r\n    return b'\xff'\n\nx = 1")?;

        let read = read_lines(&path).expect("file should be readable");
        assert_eq!(read.len(), 4);
        assert_eq!(read[0], "def f():");
        assert!(read[1].contains('\u{FFFD}'));
        assert_eq!(read[2], "");
        assert_eq!(read[3], "x = 1");
        Ok(())
    }

    #[test]
    fn test_read_missing_file_is_read_error() {
        let err = Module::read(Path::new("/definitely/missing.py"), &BlockParser::default())
            .expect_err("missing file should fail");
        assert!(matches!(err, PystatsError::Read { .. }));
    }

    #[test]
    fn test_parse_modules_skips_unreadable_and_keeps_order() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let first = temp_dir.path().join("b.py");
        let second = temp_dir.path().join("a.py");
        fs::write(&first, "def f():\n    pass\n")?;
        fs::write(&second, "")?;
        let missing = temp_dir.path().join("missing.py");

        let mut log = quiet_log();
        let modules = parse_modules(
            &[first.clone(), missing, second.clone(), PathBuf::new()],
            &BlockParser::default(),
            &mut log,
        );

        let names: Vec<_> = modules.iter().map(|m| m.filename.clone()).collect();
        assert_eq!(
            names,
            vec![
                first.to_string_lossy().into_owned(),
                second.to_string_lossy().into_owned(),
            ]
        );
        assert_eq!(modules[0].functions.len(), 1);
        assert!(modules[1].lines.is_empty(), "empty files still parse");
        assert_eq!(log.modules_parsed(), 2);
        assert_eq!(log.files_skipped(), 1);
        Ok(())
    }
}
