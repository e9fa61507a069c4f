//! Storage result types
//!
//! Defines result structures returned by storage operations.

use crate::error::ExplorerError;

/// One inspectable directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    /// Zero for directories
    pub size: u64,
    /// Seconds since the Unix epoch, zero when unknown
    pub modified: u64,
}

impl EntryInfo {
    /// Console listing format: `name|size|timestamp`, directories end in `/`
    pub fn to_line(&self) -> String {
        let suffix = if self.is_dir { "/" } else { "" };
        format!("{}{}|{}|{}", self.name, suffix, self.size, self.modified)
    }
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Root-relative path of the listed directory, `.` for the root
    pub path: String,
    pub entries: Vec<EntryInfo>,
    /// Entries whose metadata could not be read
    pub skipped: Vec<String>,
}

/// Result of storing the files of one upload
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Root-relative directory the files were written to
    pub directory: String,
    /// Root-relative paths of the written files
    pub stored: Vec<String>,
    /// Filename and cause of every file that could not be written
    pub failed: Vec<(String, ExplorerError)>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
