use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use walkdir::{DirEntry, WalkDir};

/// A directory entry with symlinks already followed.
#[derive(Debug, Clone)]
pub struct Child {
    /// File name, lossily converted when it is not valid UTF-8.
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub is_file: bool,
}

impl Child {
    fn resolve(entry: DirEntry) -> Result<Self> {
        let name = entry.file_name().to_string_lossy().into_owned();
        let (is_dir, is_file) = if entry.path_is_symlink() {
            let metadata = fs::metadata(entry.path())?;
            (metadata.is_dir(), metadata.is_file())
        } else {
            let file_type = entry.file_type();
            (file_type.is_dir(), file_type.is_file())
        };
        Ok(Self {
            name,
            path: entry.into_path(),
            is_dir,
            is_file,
        })
    }
}

/// Lists the children of `dir`, one level deep. Entries that can not be
/// inspected (broken links, permission errors) are returned as `Err` so the
/// caller can count them. Fails only when `dir` itself can not be read.
///
/// Links are resolved here rather than by walkdir so that a link back to an
/// ancestor is still listed; the traversal decides whether to enter it.
pub fn list_children(dir: &Path) -> Result<Vec<Result<Child>>> {
    let mut children = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        match entry {
            Ok(entry) => children.push(Child::resolve(entry)),
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => children.push(Err(e.into())),
        }
    }
    Ok(children)
}

/// Number of path components between `root` and `dir`, both canonical.
/// `None` when `dir` lies outside of `root`.
pub fn directory_depth(root: &Path, dir: &Path) -> Option<usize> {
    dir.strip_prefix(root).ok().map(|rest| rest.components().count())
}

/// True when `dir` resolves to somewhere other than a direct child of
/// `expected_parent` (canonical), e.g. a symlink pointing back to an ancestor.
pub fn escapes_parent(dir: &Path, expected_parent: &Path) -> bool {
    match fs::canonicalize(dir) {
        Ok(real) => real.parent() != Some(expected_parent),
        Err(_) => true,
    }
}

/// `path` relative to `root`, with a trailing separator for directories.
pub fn relative_display(root: &Path, path: &Path, is_dir: bool) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut out = rel.to_string_lossy().into_owned();
    if is_dir && !out.ends_with(MAIN_SEPARATOR) {
        out.push(MAIN_SEPARATOR);
    }
    out
}
