//! Input enumeration.
//!
//! Flattens an input path into a root directory plus an ordered list of
//! `/`-separated names relative to it. The order of that list becomes the
//! order of the logical stream, so it is fixed before any chunk is written.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::{Error, Result};

/// Files to encode: `root.join(name)` for every name, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSet {
    pub root: PathBuf,
    pub names: Vec<String>,
}

impl InputSet {
    pub fn new(root: impl Into<PathBuf>, names: Vec<String>) -> Self {
        Self {
            root: root.into(),
            names,
        }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Enumerate `path`.
///
/// A plain file yields its basename relative to its parent. A directory
/// yields every file below it, depth first, with entries of each directory
/// in byte-wise name order. Symlinks to files are followed; symlinked
/// directories are not descended.
///
/// # Errors
///
/// - `Error::InputNotFound`: `path` does not exist
/// - `Error::UnsupportedName`: a name is not valid UTF-8
pub fn enumerate(path: &Path) -> Result<InputSet> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::InputNotFound(path.to_path_buf()))
        }
        Err(err) => return Err(Error::source_read(path.display(), err)),
    };

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .ok_or_else(|| Error::NotAFile(path.to_path_buf()))?;
        let name = name
            .to_str()
            .ok_or_else(|| Error::UnsupportedName(path.to_path_buf()))?;
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        return Ok(InputSet::new(root, vec![name.to_string()]));
    }

    let names = walk(path)?;
    Ok(InputSet::new(path, names))
}

fn walk(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let context = err.path().unwrap_or(root).display().to_string();
            Error::source_read(context, err.into())
        })?;
        let path = entry.path();
        let file_type = entry.file_type();
        // Dangling links and links to directories are skipped.
        let wanted = file_type.is_file()
            || (file_type.is_symlink() && fs::metadata(path).map(|m| m.is_file()).unwrap_or(false));
        if !wanted {
            continue;
        }
        names.push(relative_name(root, path)?);
    }
    Ok(names)
}

/// `path` below `root` as a `/`-joined name.
fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::NotAFile(path.to_path_buf()))?;
    let parts = relative
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| Error::UnsupportedName(path.to_path_buf()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}
