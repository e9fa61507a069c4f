//! Console response handling
//!
//! Status codes follow HTTP so callers can reuse the same mapping.

pub const OK: u16 = 200;
pub const PARTIAL: u16 = 207;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const OPENING: u16 = 150;
pub const BAD_REQUEST: u16 = 400;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const TOO_MANY_CONNECTIONS: u16 = 421;
pub const UNKNOWN_COMMAND: u16 = 500;

/// Format a console response line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
