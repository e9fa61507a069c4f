//! Primary and fallback relocation strategies

use log::{info, warn};
use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use tokio::fs;

use crate::error::{ExplorerError, Result, is_busy, is_permission_denied};
use crate::storage::ConfinedPath;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The atomic rename primitive tried first for rename and move, and the
/// copy-then-remove fallback run when that rename is refused.
pub trait RenameStrategy: Send + Sync {
    fn rename(&self, from: &Path, to: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Copies `from` to `to`, then removes `from`. The source is only
    /// removed once every entry under it has been copied.
    fn copy_then_remove(
        &self,
        from: &Path,
        to: &Path,
    ) -> impl Future<Output = io::Result<()>> + Send {
        copy_then_remove(from, to)
    }
}

/// The host filesystem's own rename.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRename;

impl RenameStrategy for NativeRename {
    fn rename(&self, from: &Path, to: &Path) -> impl Future<Output = io::Result<()>> + Send {
        fs::rename(from.to_path_buf(), to.to_path_buf())
    }
}

/// Runs the primary strategy and, only when it is refused for lack of
/// permission, falls back to copying the entry and removing the original.
pub(crate) async fn relocate<S: RenameStrategy>(
    strategy: &S,
    source: &ConfinedPath,
    destination: &ConfinedPath,
) -> Result<()> {
    let err = match strategy
        .rename(source.as_path(), destination.as_path())
        .await
    {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    if !is_permission_denied(&err) {
        // A missing parent or a bad name on the destination side is reported
        // against the destination while the source is still in place.
        let blamed = match fs::symlink_metadata(source.as_path()).await {
            Ok(_) => destination,
            Err(_) => source,
        };
        return Err(ExplorerError::from_io(err, blamed.display_name()));
    }

    warn!(
        "Rename of {} to {} was refused ({}), falling back to copy and remove",
        source.display_name(),
        destination.display_name(),
        err
    );

    match strategy
        .copy_then_remove(source.as_path(), destination.as_path())
        .await
    {
        Ok(()) => {
            info!(
                "Relocated {} to {} by copy and remove",
                source.display_name(),
                destination.display_name()
            );
            Ok(())
        }
        Err(fallback_err) if is_busy(&fallback_err) => {
            Err(ExplorerError::Busy(source.display_name()))
        }
        Err(fallback_err) => {
            warn!(
                "Copy and remove fallback for {} failed: {}",
                source.display_name(),
                fallback_err
            );
            Err(ExplorerError::RelocationDenied {
                from: source.display_name(),
                to: destination.display_name(),
            })
        }
    }
}

async fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let skipped = copy_tree(from, to).await?;
    if skipped > 0 {
        // The copy is incomplete; keep the source and drop the partial copy.
        remove_tree(to).await?;
        return Err(io::Error::other(format!(
            "{skipped} symbolic link(s) cannot be copied"
        )));
    }
    remove_tree(from).await
}

/// Duplicates a file, or a directory depth-first, returning how many
/// symbolic links were skipped. Links are never followed or recreated, so a
/// copy never pulls in content from outside the tree.
pub fn copy_tree<'a>(from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<usize>> {
    Box::pin(async move {
        let metadata = fs::symlink_metadata(from).await?;

        if metadata.file_type().is_symlink() {
            warn!(
                "Skipping symbolic link {:?} while copying",
                from.file_name().unwrap_or_default()
            );
            return Ok(1);
        }

        let mut skipped = 0;
        if metadata.is_dir() {
            fs::create_dir_all(to).await?;
            let mut entries = fs::read_dir(from).await?;
            while let Some(entry) = entries.next_entry().await? {
                skipped += copy_tree(&entry.path(), &to.join(entry.file_name())).await?;
            }
        } else {
            fs::copy(from, to).await?;
        }
        Ok(skipped)
    })
}

/// Removes a file or a whole directory tree. Entries that disappear while
/// the removal is running are not errors.
pub fn remove_tree(path: &Path) -> BoxFuture<'_, io::Result<()>> {
    Box::pin(async move {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        if !metadata.is_dir() {
            return ignore_missing(fs::remove_file(path).await);
        }

        let mut entries = match fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            remove_tree(&entry.path()).await?;
        }
        ignore_missing(fs::remove_dir(path).await)
    })
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
