//! Error handling
//!
//! Defines error types and the mapping to console status codes.

pub mod handlers;
pub mod types;

pub use handlers::{error_reply, error_to_status_code};
pub use types::*;
