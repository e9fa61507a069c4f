//! Path validation
//!
//! Confines every caller-supplied path to the configured root. Resolution is
//! purely lexical: no filesystem access happens before a path is accepted.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{ExplorerError, Result};

/// A path proven to lie inside the root it was resolved against.
///
/// Carries both the absolute location (for filesystem calls) and the
/// root-relative form (for messages and results shown to callers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedPath {
    absolute: PathBuf,
    relative: PathBuf,
}

impl ConfinedPath {
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn is_root(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }

    /// Root-relative form for display; the root itself shows as `.`.
    pub fn display_name(&self) -> String {
        if self.is_root() {
            ".".to_string()
        } else {
            self.relative.to_string_lossy().into_owned()
        }
    }

    /// Child entry named by a single path component.
    pub(crate) fn join_name(&self, name: &OsStr) -> ConfinedPath {
        debug_assert!(matches!(
            Path::new(name).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        ));
        ConfinedPath {
            absolute: self.absolute.join(name),
            relative: self.relative.join(name),
        }
    }

    /// Containing directory, or `None` for the root itself.
    pub fn parent(&self) -> Option<ConfinedPath> {
        if self.is_root() {
            return None;
        }
        Some(ConfinedPath {
            absolute: self.absolute.parent()?.to_path_buf(),
            relative: self.relative.parent()?.to_path_buf(),
        })
    }

    /// Sibling entry with a different final component.
    pub(crate) fn with_file_name(&self, name: &OsStr) -> Option<ConfinedPath> {
        Some(self.parent()?.join_name(name))
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.relative.file_name()
    }

    pub fn starts_with(&self, other: &ConfinedPath) -> bool {
        self.absolute.starts_with(&other.absolute)
    }
}

/// Lexically normalizes a path: drops `.`, resolves `..` against the
/// preceding segment and never climbs above the filesystem root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Resolves `candidate` against `root` and accepts it only if the result is
/// the root or one of its descendants.
///
/// An absolute candidate replaces the root before the containment check,
/// an empty one means the root itself. Containment is compared component by
/// component, so `/srv/data2` is never inside `/srv/data`.
pub fn confine(root: &Path, candidate: impl AsRef<Path>) -> Result<ConfinedPath> {
    let candidate = candidate.as_ref();
    let root = normalize_path(root);
    let resolved = normalize_path(&root.join(candidate));

    match resolved.strip_prefix(&root) {
        Ok(relative) => Ok(ConfinedPath {
            relative: relative.to_path_buf(),
            absolute: resolved,
        }),
        Err(_) => Err(ExplorerError::AccessDenied(
            candidate.to_string_lossy().into_owned(),
        )),
    }
}

/// Joins a session's current directory with a command argument, producing a
/// candidate suitable for [`confine`]. Absolute arguments are kept as is.
pub fn resolve_cwd_path(current_dir: &str, target: &str) -> PathBuf {
    Path::new(current_dir).join(target)
}
