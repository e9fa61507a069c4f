//! Storage operations
//!
//! Directory listing, file retrieval and upload storage inside the root.

use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;

use crate::error::{ExplorerError, Result};
use crate::multipart::Part;
use crate::storage::results::{EntryInfo, Listing, UploadReport};
use crate::storage::validation::{ConfinedPath, confine, resolve_cwd_path};

/// Field that selects the upload's target directory.
pub const UPLOAD_PATH_FIELD: &str = "path";

/// Lists a directory. Symbolic links are left out, and entries that cannot
/// be inspected are recorded in `skipped` rather than failing the listing.
pub async fn list_directory(dir: &ConfinedPath) -> Result<Listing> {
    let metadata = fs::metadata(dir.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, dir.display_name()))?;
    if !metadata.is_dir() {
        return Err(ExplorerError::InvalidArgument(format!(
            "{} is not a directory",
            dir.display_name()
        )));
    }

    let mut read_dir = fs::read_dir(dir.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, dir.display_name()))?;

    let mut listing = Listing {
        path: dir.display_name(),
        ..Listing::default()
    };

    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| ExplorerError::from_io(e, dir.display_name()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        match inspect_entry(&entry.path(), &name).await {
            Ok(Some(info)) => listing.entries.push(info),
            Ok(None) => {}
            Err(e) => {
                debug!("Skipping {} in {}: {}", name, listing.path, e);
                listing.skipped.push(name);
            }
        }
    }

    listing
        .entries
        .sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));

    info!(
        "Listed directory {} - {} entries, {} skipped",
        listing.path,
        listing.entries.len(),
        listing.skipped.len()
    );
    Ok(listing)
}

async fn inspect_entry(path: &Path, name: &str) -> io::Result<Option<EntryInfo>> {
    let metadata = fs::symlink_metadata(path).await?;
    if metadata.file_type().is_symlink() {
        return Ok(None);
    }

    let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|dur| dur.as_secs())
        .unwrap_or(0);

    Ok(Some(EntryInfo {
        name: name.to_string(),
        is_dir: metadata.is_dir(),
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        modified,
    }))
}

/// Prepares for file retrieval: the target must be a regular file.
/// Returns its location and size.
pub async fn prepare_file_retrieval(target: &ConfinedPath) -> Result<(PathBuf, u64)> {
    let metadata = fs::symlink_metadata(target.as_path())
        .await
        .map_err(|e| ExplorerError::from_io(e, target.display_name()))?;

    if !metadata.is_file() {
        return Err(ExplorerError::NotFound(target.display_name()));
    }

    Ok((target.as_path().to_path_buf(), metadata.len()))
}

/// Writes every file part of an upload.
///
/// The last `path` field, if any, names the target directory relative to
/// `base_dir` (itself relative to the root). Files are written
/// independently, so one failure does not stop the others; existing files of
/// the same name are replaced.
pub async fn store_uploads(root: &Path, base_dir: &str, parts: &[Part]) -> Result<UploadReport> {
    let directory = parts
        .iter()
        .rev()
        .find(|part| part.name == UPLOAD_PATH_FIELD && !part.is_file())
        .map(Part::text)
        .unwrap_or_default();
    let target_dir = confine(root, resolve_cwd_path(base_dir, directory.trim()))?;

    let files: Vec<(&str, &Part)> = parts
        .iter()
        .filter_map(|part| match part.filename.as_deref() {
            Some(filename) if !filename.is_empty() => Some((filename, part)),
            _ => None,
        })
        .collect();

    if files.is_empty() {
        return Err(ExplorerError::InvalidArgument(
            "upload contains no files".into(),
        ));
    }

    let mut report = UploadReport {
        directory: target_dir.display_name(),
        ..UploadReport::default()
    };

    for (filename, part) in files {
        match store_file(root, &target_dir, filename, &part.data).await {
            Ok(stored) => {
                info!("Stored upload {} ({} bytes)", stored.display_name(), part.data.len());
                report.stored.push(stored.display_name());
            }
            Err(e) => {
                warn!("Failed to store upload {}: {}", filename, e);
                report.failed.push((filename.to_string(), e));
            }
        }
    }

    Ok(report)
}

async fn store_file(
    root: &Path,
    target_dir: &ConfinedPath,
    filename: &str,
    data: &[u8],
) -> Result<ConfinedPath> {
    // Browsers on some platforms send the client-side path; keep the last segment.
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." {
        return Err(ExplorerError::InvalidArgument(format!(
            "invalid filename {filename:?}"
        )));
    }

    let target = confine(root, target_dir.relative().join(base))?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent.as_path())
            .await
            .map_err(|e| ExplorerError::from_io(e, parent.display_name()))?;
    }

    fs::write(target.as_path(), data)
        .await
        .map_err(|e| ExplorerError::from_io(e, target.display_name()))?;
    Ok(target)
}
