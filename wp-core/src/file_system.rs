//! File system helpers for instance trees: deep copies, shared references and
//! removal that never follows a shared reference into another instance.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Result, WpError};

/// Recursively copy `src` into `dst`, creating `dst` if needed.
///
/// A symlinked `src` root is resolved first, so copying a tree that is itself
/// a shared reference produces an independent copy of the backing files.
/// Symlinks inside the tree are recreated as symlinks. Returns the number of
/// regular files copied.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<u64> {
    let root = fs::canonicalize(src).map_err(|e| {
        WpError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot resolve copy source {}: {}", src.display(), e),
        ))
    })?;
    fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| WpError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(&root)
            .map_err(|e| WpError::Internal(e.to_string()))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let destination = fs::read_link(link)?;
    std::os::unix::fs::symlink(destination, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    fs::copy(link, target)?;
    Ok(())
}

/// Replace whatever is at `link` with a symlink pointing to `target`.
#[cfg(unix)]
pub fn replace_with_symlink(link: &Path, target: &Path) -> Result<()> {
    remove_path(link)?;
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn replace_with_symlink(_link: &Path, _target: &Path) -> Result<()> {
    Err(WpError::Validation(
        "Shared-reference clones require a unix host".to_string(),
    ))
}

/// Whether `path` is a symlink (without following it).
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Remove a file, directory tree or symlink. A symlink is unlinked, never
/// followed. Missing paths are not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if metadata.file_type().is_symlink() || metadata.is_file() {
        fs::remove_file(path)?;
    } else {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}
