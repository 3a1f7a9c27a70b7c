//! Clone strategies: how a target instance's payload relates to its source.
//!
//! Ports, networks and credentials always come from a fresh `create`; only
//! the WordPress tree and (for full copies) the database are carried over.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;
use wp_core::error::{Result, WpError};
use wp_core::file_system::{copy_dir_all, remove_path, replace_with_symlink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneStrategy {
    /// Target references the source's WordPress files; the source owns them.
    SharedReference,
    /// Deep copy of files plus a dump/restore of the database.
    #[default]
    FullCopy,
    /// Deep copy of files; the target keeps its fresh, empty database.
    FilesOnlyCopy,
}

impl CloneStrategy {
    pub const ALL: [CloneStrategy; 3] = [
        CloneStrategy::SharedReference,
        CloneStrategy::FullCopy,
        CloneStrategy::FilesOnlyCopy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CloneStrategy::SharedReference => "shared-reference",
            CloneStrategy::FullCopy => "full-copy",
            CloneStrategy::FilesOnlyCopy => "files-only-copy",
        }
    }

    pub fn copies_database(&self) -> bool {
        matches!(self, CloneStrategy::FullCopy)
    }
}

impl fmt::Display for CloneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloneStrategy {
    type Err = WpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared-reference" | "shared" | "reference" => Ok(CloneStrategy::SharedReference),
            "full-copy" | "full" | "copy" => Ok(CloneStrategy::FullCopy),
            "files-only-copy" | "files-only" | "files" => Ok(CloneStrategy::FilesOnlyCopy),
            other => Err(WpError::Validation(format!(
                "Unknown clone strategy '{}': expected shared-reference, full-copy or files-only-copy",
                other
            ))),
        }
    }
}

/// Apply the file half of `strategy`, replacing whatever is at `target`.
///
/// A source tree that is itself a shared reference is resolved first, so a
/// reference always points at real files.
pub fn apply_files(strategy: CloneStrategy, source: &Path, target: &Path) -> Result<()> {
    let backing = source.canonicalize().map_err(|e| {
        WpError::NotFound(format!("Source WordPress files {:?} are unavailable: {}", source, e))
    })?;

    match strategy {
        CloneStrategy::SharedReference => {
            replace_with_symlink(target, &backing)?;
            info!("Linked {:?} -> {:?}", target, backing);
        }
        CloneStrategy::FullCopy | CloneStrategy::FilesOnlyCopy => {
            remove_path(target)?;
            let copied = copy_dir_all(&backing, target)?;
            info!("Copied {} files from {:?} to {:?}", copied, backing, target);
        }
    }
    Ok(())
}
