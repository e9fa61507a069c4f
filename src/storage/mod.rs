//! File system storage management
//!
//! Path confinement, directory listing, file retrieval and upload storage.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::{list_directory, prepare_file_retrieval, store_uploads};
pub use results::{EntryInfo, Listing, UploadReport};
pub use validation::{ConfinedPath, confine, normalize_path, resolve_cwd_path};
