//! Error types
//!
//! Defines the error taxonomy shared by the guard, the multipart decoder,
//! the relocation engine and the storage operations.

use std::io;
use thiserror::Error;

/// Coarse classification of an [`ExplorerError`], used by callers to pick
/// a client-visible status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AccessDenied,
    NotFound,
    AlreadyExists,
    InvalidArgument,
    Busy,
    Internal,
}

/// Errors surfaced by every core operation.
///
/// Messages only ever carry caller-visible (root-relative or caller-supplied)
/// paths, never the absolute location of the root.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Resource busy: {0} is locked by another process")]
    Busy(String),

    #[error(
        "Permission denied relocating {from} to {to}: the host filesystem refused both the rename \
         and the copy fallback, check the permissions on both locations"
    )]
    RelocationDenied { from: String, to: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ExplorerError {
    /// Classifies a low-level I/O error raised while touching `path`.
    pub fn from_io(err: io::Error, path: impl Into<String>) -> Self {
        let path = path.into();
        if is_busy(&err) {
            return ExplorerError::Busy(path);
        }
        match err.kind() {
            io::ErrorKind::NotFound => ExplorerError::NotFound(path),
            io::ErrorKind::AlreadyExists => ExplorerError::AlreadyExists(path),
            io::ErrorKind::PermissionDenied => ExplorerError::AccessDenied(path),
            _ => ExplorerError::Io { path, source: err },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExplorerError::AccessDenied(_) | ExplorerError::RelocationDenied { .. } => {
                ErrorKind::AccessDenied
            }
            ExplorerError::NotFound(_) => ErrorKind::NotFound,
            ExplorerError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ExplorerError::InvalidArgument(_) | ExplorerError::MalformedRequest(_) => {
                ErrorKind::InvalidArgument
            }
            ExplorerError::Busy(_) => ErrorKind::Busy,
            ExplorerError::Io { .. } => ErrorKind::Internal,
        }
    }
}

/// Returns true when the error means another process holds the entry.
pub fn is_busy(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::ResourceBusy {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Returns true when the error is a permission-class failure.
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

pub type Result<T> = std::result::Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(
            ExplorerError::from_io(not_found, "a.txt").kind(),
            ErrorKind::NotFound
        );

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(
            ExplorerError::from_io(denied, "a.txt").kind(),
            ErrorKind::AccessDenied
        );

        let busy = io::Error::new(io::ErrorKind::ResourceBusy, "locked");
        assert_eq!(ExplorerError::from_io(busy, "a.txt").kind(), ErrorKind::Busy);

        let other = io::Error::other("disk on fire");
        assert_eq!(
            ExplorerError::from_io(other, "a.txt").kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn relocation_denied_names_both_paths() {
        let err = ExplorerError::RelocationDenied {
            from: "photos/a.jpg".into(),
            to: "archive/a.jpg".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("photos/a.jpg"));
        assert!(msg.contains("archive/a.jpg"));
        assert!(msg.contains("permissions"));
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[test]
    fn malformed_request_is_an_invalid_argument() {
        let err = ExplorerError::MalformedRequest("missing boundary".into());
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
