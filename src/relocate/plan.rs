//! Destination resolution for copy and move

use std::ffi::OsString;
use std::io;
use std::path::Path;
use tokio::fs;

use crate::error::{ExplorerError, Result};
use crate::storage::ConfinedPath;

/// Resolved source and destination of a copy or move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub source: ConfinedPath,
    pub destination: ConfinedPath,
}

/// Resolves where `source` will land when copied or moved to `dest`.
///
/// An existing directory destination receives the source under its own
/// name; an occupied destination gets the first free ` (n)` suffix. The
/// destination's missing ancestors are created.
pub async fn plan_relocation(source: &ConfinedPath, dest: &ConfinedPath) -> Result<RelocationPlan> {
    if source.is_root() {
        return Err(ExplorerError::InvalidArgument(
            "the root directory cannot be relocated".into(),
        ));
    }

    let source_meta = fs::symlink_metadata(source.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, source.display_name()))?;

    let mut destination = dest.clone();
    if is_dir(dest.as_path()).await {
        if let Some(name) = source.file_name() {
            destination = dest.join_name(name);
        }
    }

    if source_meta.is_dir() && destination.starts_with(source) {
        return Err(ExplorerError::InvalidArgument(format!(
            "cannot place {} inside itself",
            source.display_name()
        )));
    }

    let destination = disambiguate(destination, source_meta.is_dir()).await?;

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent.as_path())
            .await
            .map_err(|e| ExplorerError::from_io(e, parent.display_name()))?;
    }

    Ok(RelocationPlan {
        source: source.clone(),
        destination,
    })
}

/// Returns `target` if nothing exists there, else the first unused
/// `name (1).ext`, `name (2).ext`, ... sibling. Directories keep dots in their
/// names and take the suffix at the end.
pub async fn disambiguate(target: ConfinedPath, is_dir: bool) -> Result<ConfinedPath> {
    if !entry_exists(&target).await? {
        return Ok(target);
    }

    let name = Path::new(target.file_name().ok_or_else(|| {
        ExplorerError::AlreadyExists(target.display_name())
    })?);
    let (stem, extension) = match (name.file_stem(), name.extension()) {
        (Some(stem), Some(ext)) if !is_dir => (stem.to_os_string(), Some(ext.to_os_string())),
        _ => (name.as_os_str().to_os_string(), None),
    };

    for n in 1u32.. {
        let mut candidate = OsString::from(&stem);
        candidate.push(format!(" ({n})"));
        if let Some(ext) = &extension {
            candidate.push(".");
            candidate.push(ext);
        }

        let sibling = target
            .with_file_name(&candidate)
            .ok_or_else(|| ExplorerError::AlreadyExists(target.display_name()))?;
        if !entry_exists(&sibling).await? {
            return Ok(sibling);
        }
    }

    Err(ExplorerError::AlreadyExists(target.display_name()))
}

/// True for anything at `path`, dangling symbolic links included.
async fn entry_exists(path: &ConfinedPath) -> Result<bool> {
    match fs::symlink_metadata(path.as_path()).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ExplorerError::from_io(e, path.display_name())),
    }
}

/// Real directories only; a link to a directory is not followed.
async fn is_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
