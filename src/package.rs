//! Package-root discovery and tree rendering.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{PystatsError, Result};
use crate::progress::RunLog;

const IGNORED_DIRS: [&str; 1] = ["__pycache__"];

const BRANCH_MIDDLE: &str = "├── ";
const BRANCH_LAST: &str = "└── ";
const PARENT_MIDDLE: &str = "│   ";
const PARENT_LAST: &str = "    ";

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory names skipped in addition to hidden and cache directories.
    pub ignore: Vec<String>,
    pub max_depth: usize,
    pub filespec: Option<Pattern>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            ignore: Vec::new(),
            max_depth: 100,
            filespec: None,
        }
    }
}

pub fn compile_filespec(spec: &str) -> Result<Pattern> {
    Pattern::new(spec).map_err(|source| PystatsError::InvalidFilespec {
        spec: spec.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
struct TreeEntry {
    path: PathBuf,
    name: String,
    is_dir: bool,
    /// For each ancestor below the root, whether it was the last child.
    ancestors_last: Vec<bool>,
    is_last: bool,
}

/// A walked package directory: every visible entry in depth-first,
/// name-sorted order.
#[derive(Debug, Clone)]
pub struct PackageTree {
    root: PathBuf,
    entries: Vec<TreeEntry>,
    filespec: Option<Pattern>,
}

fn is_skipped(name: &str, options: &WalkOptions) -> bool {
    name.starts_with('.')
        || IGNORED_DIRS.contains(&name)
        || options.ignore.iter().any(|ignored| ignored == name)
}

/// Visible children of `dir`, sorted by name. Symlinks are left out.
fn read_children(dir: &Path, options: &WalkOptions) -> io::Result<Vec<(PathBuf, String, bool)>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_skipped(&name, options) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() || file_type.is_file() {
            children.push((entry.path(), name, file_type.is_dir()));
        }
    }
    children.sort_by(|(_, a, _), (_, b, _)| a.cmp(b));
    Ok(children)
}

fn walk(
    dir: &Path,
    depth: usize,
    ancestors_last: &mut Vec<bool>,
    options: &WalkOptions,
    entries: &mut Vec<TreeEntry>,
    log: &mut RunLog,
) {
    let children = match read_children(dir, options) {
        Ok(children) => children,
        Err(err) => {
            log::debug!("cannot read directory {}: {}", dir.display(), err);
            let message = format!("Error reading directory {}: {}", dir.display(), err);
            log.warning(&message);
            return;
        }
    };

    let count = children.len();
    for (idx, (path, name, is_dir)) in children.into_iter().enumerate() {
        let is_last = idx + 1 == count;
        entries.push(TreeEntry {
            path: path.clone(),
            name,
            is_dir,
            ancestors_last: ancestors_last.clone(),
            is_last,
        });

        if !is_dir {
            continue;
        }
        if depth + 1 > options.max_depth {
            log.warning(&format!(
                "Maximum directory depth ({}) reached at {}",
                options.max_depth,
                path.display()
            ));
            continue;
        }
        ancestors_last.push(is_last);
        walk(&path, depth + 1, ancestors_last, options, entries, log);
        ancestors_last.pop();
    }
}

impl PackageTree {
    /// Walks `root`. Only an unreadable root is an error; unreadable
    /// subdirectories are logged and left empty.
    pub fn discover(root: &Path, options: &WalkOptions, log: &mut RunLog) -> Result<Self> {
        // probe the root so a bad package path fails before any work
        fs::read_dir(root).map_err(|source| PystatsError::PackageRoot {
            path: root.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        walk(root, 0, &mut Vec::new(), options, &mut entries, log);
        Ok(PackageTree {
            root: root.to_path_buf(),
            entries,
            filespec: options.filespec.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn matches(&self, path: &Path) -> bool {
        self.filespec
            .as_ref()
            .map(|pattern| filespec_matches(pattern, &self.root, path))
            .unwrap_or(true)
    }

    /// Files accepted by the filespec, in walk order.
    pub fn source_files(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_dir && self.matches(&entry.path))
            .map(|entry| entry.path.clone())
            .collect()
    }

    fn root_display_name(&self) -> String {
        let name = self
            .root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.to_string_lossy().into_owned());
        format!("{}/", name.trim_end_matches('/'))
    }

    /// The tree as text lines, root first.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        lines.push(self.root_display_name());
        for entry in &self.entries {
            let mut line = String::new();
            for &ancestor_last in &entry.ancestors_last {
                let column = if ancestor_last {
                    PARENT_LAST
                } else {
                    PARENT_MIDDLE
                };
                line.push_str(column);
            }
            let branch = if entry.is_last {
                BRANCH_LAST
            } else {
                BRANCH_MIDDLE
            };
            line.push_str(branch);
            line.push_str(&entry.name);
            if entry.is_dir {
                line.push('/');
            }
            lines.push(line);
        }
        lines
    }
}

/// Matches the pattern against the file name, then against the
/// root-relative path with `/` separators.
fn filespec_matches(pattern: &Pattern, root_path: &Path, file_path: &Path) -> bool {
    if file_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| pattern.matches(name))
        .unwrap_or(false)
    {
        return true;
    }

    let relative = match file_path.strip_prefix(root_path) {
        Ok(rel) => rel,
        Err(_) => return false,
    };

    let rel_str = match relative.to_str() {
        Some(s) => s.replace('\\', "/"),
        None => return false,
    };

    pattern.matches(&rel_str)
}
