//! Indentation-based block extraction.
//!
//! A block opens on a line that starts with `indent * level + keyword` and
//! closes on the next non-blank line whose indentation is at or below `level`.
//! Nothing here tokenizes: strings or comments that look like blocks are
//! treated as blocks.

use std::hash::{Hash, Hasher};

/// One indentation level, four spaces.
pub const INDENT: &str = "    ";

pub const FUNCTION_KEYWORD: &str = "def";
pub const CLASS_KEYWORD: &str = "class";

/// A contiguous function, method or class found in a module.
///
/// `start..end` indexes the owning module's lines, never a parent block's.
/// Identity is `(keyword, signature, start, end)`; `lines` is a snapshot that
/// takes no part in equality or hashing.
#[derive(Debug, Clone, Default)]
pub struct CodeBlock {
    pub keyword: String,
    pub signature: String,
    pub start: usize,
    pub end: usize,
    pub lines: Vec<String>,
}

impl CodeBlock {
    pub fn new(keyword: &str, signature: &str, start: usize, end: usize) -> Self {
        CodeBlock {
            keyword: keyword.to_string(),
            signature: signature.to_string(),
            start,
            end,
            lines: Vec::new(),
        }
    }

    /// Number of lines spanned, signature included.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for CodeBlock {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword
            && self.signature == other.signature
            && self.start == other.start
            && self.end == other.end
    }
}

impl Eq for CodeBlock {}

impl Hash for CodeBlock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keyword.hash(state);
        self.signature.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

/// Counts whole repetitions of `indent` at the start of `line`.
///
/// A ragged tail (fewer characters than one unit) is ignored. An empty unit
/// always yields 0.
pub fn num_indents(line: &str, indent: &str) -> usize {
    if indent.is_empty() {
        return 0;
    }
    let mut rest = line;
    let mut count = 0;
    while let Some(tail) = rest.strip_prefix(indent) {
        rest = tail;
        count += 1;
    }
    count
}

/// Drops the final character, normally the `:` ending a block header.
fn strip_terminator(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next_back();
    chars.as_str()
}

struct OpenBlock {
    signature: String,
    start: usize,
}

#[derive(Debug, Clone)]
pub struct BlockParser {
    indent: String,
}

impl Default for BlockParser {
    fn default() -> Self {
        BlockParser::new(INDENT)
    }
}

impl BlockParser {
    pub fn new(indent: &str) -> Self {
        BlockParser {
            indent: indent.to_string(),
        }
    }

    /// Indentation unit of `width` spaces.
    pub fn with_width(width: usize) -> Self {
        BlockParser {
            indent: " ".repeat(width),
        }
    }

    /// Single pass over `lines`, returning every `keyword` block opened at
    /// `indent_level`, with `offset` added to each start and end.
    ///
    /// Whitespace-only lines never open or close a block but stay inside the
    /// `lines` snapshot of the block around them. A block still open at the
    /// end of input runs to `lines.len()`.
    pub fn codeblocks<S: AsRef<str>>(
        &self,
        lines: &[S],
        keyword: &str,
        indent_level: usize,
        offset: usize,
    ) -> Vec<CodeBlock> {
        let prefix = format!("{}{}", self.indent.repeat(indent_level), keyword);
        let mut open: Option<OpenBlock> = None;
        let mut blocks = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }

            if open.is_some() && num_indents(line, &self.indent) <= indent_level {
                if let Some(block) = open.take() {
                    blocks.push(emit(keyword, block, i, offset, lines));
                }
            }

            // Checked on the closing line too, so adjacent siblings both land.
            if let Some(rest) = line.strip_prefix(prefix.as_str()) {
                let signature = strip_terminator(rest.trim());
                if !signature.is_empty() {
                    open = Some(OpenBlock {
                        signature: signature.to_string(),
                        start: i,
                    });
                }
            }
        }

        if let Some(block) = open {
            blocks.push(emit(keyword, block, lines.len(), offset, lines));
        }

        blocks
    }

    pub fn functions<S: AsRef<str>>(
        &self,
        lines: &[S],
        indent_level: usize,
        offset: usize,
    ) -> Vec<CodeBlock> {
        self.codeblocks(lines, FUNCTION_KEYWORD, indent_level, offset)
    }

    pub fn classes<S: AsRef<str>>(
        &self,
        lines: &[S],
        indent_level: usize,
        offset: usize,
    ) -> Vec<CodeBlock> {
        self.codeblocks(lines, CLASS_KEYWORD, indent_level, offset)
    }
}

fn emit<S: AsRef<str>>(
    keyword: &str,
    block: OpenBlock,
    end: usize,
    offset: usize,
    lines: &[S],
) -> CodeBlock {
    let snapshot = lines[block.start..end]
        .iter()
        .map(|line| line.as_ref().to_string())
        .collect();
    CodeBlock {
        keyword: keyword.to_string(),
        signature: block.signature,
        start: block.start + offset,
        end: end + offset,
        lines: snapshot,
    }
}

/// `BlockParser::codeblocks` with the default four-space unit.
pub fn get_codeblocks<S: AsRef<str>>(
    lines: &[S],
    keyword: &str,
    indent_level: usize,
    offset: usize,
) -> Vec<CodeBlock> {
    BlockParser::default().codeblocks(lines, keyword, indent_level, offset)
}
