//! Error handlers
//!
//! Maps core errors to the status codes the console replies with.

use crate::error::types::{ErrorKind, ExplorerError};
use log::{error, warn};

/// Log an error at a level matching its severity
pub fn handle_error(err: &ExplorerError) {
    match err.kind() {
        ErrorKind::Internal => error!("Explorer error: {}", err),
        _ => warn!("Request rejected: {}", err),
    }
}

/// Convert error to a status code
pub fn error_to_status_code(err: &ExplorerError) -> u16 {
    match err.kind() {
        ErrorKind::InvalidArgument => 400,
        ErrorKind::AccessDenied => 403,
        ErrorKind::NotFound => 404,
        ErrorKind::AlreadyExists => 409,
        ErrorKind::Busy => 423,
        ErrorKind::Internal => 500,
    }
}

/// Format an error as a single console reply line
pub fn error_reply(err: &ExplorerError) -> String {
    handle_error(err);
    format!("{} {}\r\n", error_to_status_code(err), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_code() {
        let errors = [
            ExplorerError::InvalidArgument("x".into()),
            ExplorerError::AccessDenied("x".into()),
            ExplorerError::NotFound("x".into()),
            ExplorerError::AlreadyExists("x".into()),
            ExplorerError::Busy("x".into()),
            ExplorerError::Io {
                path: "x".into(),
                source: std::io::Error::other("boom"),
            },
        ];
        let mut codes: Vec<u16> = errors.iter().map(error_to_status_code).collect();
        codes.dedup();
        assert_eq!(codes, vec![400, 403, 404, 409, 423, 500]);
    }

    #[test]
    fn reply_line_ends_with_crlf() {
        let reply = error_reply(&ExplorerError::NotFound("a.txt".into()));
        assert_eq!(reply, "404 Not found: a.txt\r\n");
    }
}
