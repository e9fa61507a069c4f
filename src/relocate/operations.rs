//! Rename, move, copy and delete

use log::{info, warn};
use std::io;
use std::path::{MAIN_SEPARATOR, Path};
use tokio::fs;

use super::plan::plan_relocation;
use super::strategy::{NativeRename, RenameStrategy, copy_tree, relocate, remove_tree};
use crate::error::{ExplorerError, Result};
use crate::storage::{ConfinedPath, confine};

/// Which of the two atomic-rename based operations to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationOp {
    /// Exact destination, which must not exist yet
    Rename,
    /// Destination resolved through redirection and disambiguation
    Move,
}

/// Runs rename, move and copy on confined paths.
///
/// Generic over the primary rename strategy; [`NativeRename`] is the host's.
#[derive(Debug, Default, Clone)]
pub struct Relocator<S = NativeRename> {
    strategy: S,
}

impl Relocator<NativeRename> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: RenameStrategy> Relocator<S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    /// Renames or moves `source`, returning where it ended up.
    pub async fn rename_or_move(
        &self,
        op: RelocationOp,
        source: &ConfinedPath,
        dest: &ConfinedPath,
    ) -> Result<ConfinedPath> {
        match op {
            RelocationOp::Rename => self.rename(source, dest).await,
            RelocationOp::Move => self.move_entry(source, dest).await,
        }
    }

    /// Renames `old` to exactly `new`. Fails with `AlreadyExists` before
    /// touching anything when `new` is taken.
    pub async fn rename(&self, old: &ConfinedPath, new: &ConfinedPath) -> Result<ConfinedPath> {
        if old.is_root() {
            return Err(ExplorerError::InvalidArgument(
                "the root directory cannot be renamed".into(),
            ));
        }

        let old_meta = fs::symlink_metadata(old.as_path())
            .await
            .map_err(|e| ExplorerError::from_io(e, old.display_name()))?;

        match fs::symlink_metadata(new.as_path()).await {
            Ok(_) => return Err(ExplorerError::AlreadyExists(new.display_name())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ExplorerError::from_io(e, new.display_name())),
        }

        if old_meta.is_dir() && new.starts_with(old) {
            return Err(ExplorerError::InvalidArgument(format!(
                "cannot place {} inside itself",
                old.display_name()
            )));
        }

        relocate(&self.strategy, old, new).await?;
        info!("Renamed {} to {}", old.display_name(), new.display_name());
        Ok(new.clone())
    }

    /// Moves `source` to `dest`, never overwriting an existing entry.
    pub async fn move_entry(&self, source: &ConfinedPath, dest: &ConfinedPath) -> Result<ConfinedPath> {
        let plan = plan_relocation(source, dest).await?;
        relocate(&self.strategy, &plan.source, &plan.destination).await?;
        info!(
            "Moved {} to {}",
            plan.source.display_name(),
            plan.destination.display_name()
        );
        Ok(plan.destination)
    }

    /// Copies `source` to `dest`, never overwriting an existing entry.
    ///
    /// A failure part-way through a directory copy leaves what was already
    /// copied in place.
    ///
    /// Symbolic links are not copied: a link source is refused, and links
    /// inside a copied directory are left out.
    pub async fn copy(&self, source: &ConfinedPath, dest: &ConfinedPath) -> Result<ConfinedPath> {
        if let Ok(meta) = fs::symlink_metadata(source.as_path()).await {
            if meta.file_type().is_symlink() {
                return Err(ExplorerError::InvalidArgument(format!(
                    "{} is a symbolic link and cannot be copied",
                    source.display_name()
                )));
            }
        }

        let plan = plan_relocation(source, dest).await?;
        let skipped = copy_tree(plan.source.as_path(), plan.destination.as_path())
            .await
            .map_err(|e| ExplorerError::from_io(e, plan.source.display_name()))?;
        if skipped > 0 {
            warn!(
                "Left {} symbolic link(s) out of the copy of {}",
                skipped,
                plan.source.display_name()
            );
        }
        info!(
            "Copied {} to {}",
            plan.source.display_name(),
            plan.destination.display_name()
        );
        Ok(plan.destination)
    }
}

/// Deletes `target`, recursively for directories.
///
/// Refuses the root, the caller's current directory and that directory's
/// parent, all before any filesystem access.
pub async fn delete(root: &Path, target: &ConfinedPath, current_dir_hint: &str) -> Result<()> {
    if target.is_root() {
        return Err(ExplorerError::InvalidArgument(
            "the root directory cannot be deleted".into(),
        ));
    }

    let current = confine(root, current_dir_hint)?;
    let parent = confine(root, parent_of_hint(current_dir_hint))?;
    if target.as_path() == current.as_path() || target.as_path() == parent.as_path() {
        return Err(ExplorerError::InvalidArgument(format!(
            "cannot delete {}: it is the directory being viewed or its parent",
            target.display_name()
        )));
    }

    let metadata = fs::symlink_metadata(target.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, target.display_name()))?;

    let removal = if metadata.is_dir() {
        remove_tree(target.as_path()).await
    } else {
        fs::remove_file(target.as_path()).await
    };
    removal.map_err(|e| ExplorerError::from_io(e, target.display_name()))?;

    info!("Deleted {}", target.display_name());
    Ok(())
}

/// Parent of a caller-supplied directory: drop the last segment and rejoin.
/// An empty result stands for the root.
pub fn parent_of_hint(hint: &str) -> String {
    let is_separator = |c: char| c == '/' || c == MAIN_SEPARATOR;
    let mut segments: Vec<&str> = hint.split(is_separator).filter(|s| !s.is_empty()).collect();
    segments.pop();

    let joined = segments.join("/");
    if !joined.is_empty() && hint.starts_with(is_separator) {
        format!("/{joined}")
    } else {
        joined
    }
}
