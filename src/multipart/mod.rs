//! Multipart module
//!
//! Decodes `multipart/form-data` request bodies into named fields and file
//! payloads.

mod parser;
mod part;

pub use parser::{MultipartReader, boundary_from_content_type, decode, decode_multipart};
pub use part::Part;
