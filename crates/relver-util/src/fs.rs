use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Walk up from `start` looking for a file or directory named `name`.
/// Returns the path to the directory containing it, or `None`.
pub fn find_ancestor_with(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(name).exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Path of `target` relative to `base`, using forward slashes.
///
/// Returns an empty string when the paths are equal, and `None` when
/// `target` is not below `base`.
pub fn relative_path(base: &Path, target: &Path) -> Option<String> {
    let rel = target.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    Some(parts.join("/"))
}

/// Write `contents` to `path` atomically.
///
/// The data goes to a temporary file in the same directory first and is
/// then persisted over the target, so readers of `path` observe either
/// the complete old contents or the complete new contents.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
