//! Multipart body scanning
//!
//! A single forward pass over the body: find a delimiter line, read the
//! header block that follows it, and take everything up to the CR-LF in
//! front of the next delimiter as the payload.

use log::debug;

use super::part::Part;
use crate::error::{ExplorerError, Result};

const CRLF: &[u8] = b"\r\n";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Extracts the boundary token from a `Content-Type` header value.
///
/// The token runs from `boundary=` to the next `;` or the end of the value;
/// surrounding quotes are removed.
pub fn boundary_from_content_type(content_type: &str) -> Result<String> {
    const KEY: &str = "boundary=";

    let start = content_type
        .to_ascii_lowercase()
        .find(KEY)
        .ok_or_else(|| ExplorerError::MalformedRequest("missing multipart boundary".into()))?
        + KEY.len();

    let token = content_type[start..]
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');

    if token.is_empty() {
        return Err(ExplorerError::MalformedRequest(
            "empty multipart boundary".into(),
        ));
    }
    Ok(token.to_string())
}

/// Decodes a body whose `Content-Type` header value is `content_type`.
pub fn decode_multipart(body: &[u8], content_type: &str) -> Result<Vec<Part>> {
    let boundary = boundary_from_content_type(content_type)?;
    Ok(decode(body, &boundary))
}

/// Decodes every part of `body` in declaration order.
pub fn decode(body: &[u8], boundary: &str) -> Vec<Part> {
    MultipartReader::new(body, boundary).collect()
}

/// Lazy, single-pass iterator over the parts of a multipart body.
pub struct MultipartReader<'a> {
    body: &'a [u8],
    delimiter: Vec<u8>,
    /// `\r\n--<boundary>`: how every delimiter after the first is found
    separator: Vec<u8>,
    /// Start of the next delimiter to process; `None` once exhausted
    position: Option<usize>,
}

impl<'a> MultipartReader<'a> {
    pub fn new(body: &'a [u8], boundary: &str) -> Self {
        let delimiter = format!("--{boundary}").into_bytes();
        let mut separator = CRLF.to_vec();
        separator.extend_from_slice(&delimiter);
        let position = find(body, &delimiter, 0);

        Self {
            body,
            delimiter,
            separator,
            position,
        }
    }

    /// Scans the part that starts at the delimiter at `start`. Returns the
    /// part (or `None` when it was malformed) and the next delimiter
    /// position, or `None` entirely when the body is exhausted.
    fn scan_part(&self, start: usize) -> Option<(Option<Part>, usize)> {
        let body = self.body;
        let after_delimiter = start + self.delimiter.len();

        if body[after_delimiter..].starts_with(b"--") {
            return None;
        }

        let line_end = find(body, CRLF, after_delimiter)?;
        let header_end = find(body, HEADER_TERMINATOR, line_end)?;
        let headers = if header_end > line_end {
            &body[line_end + CRLF.len()..header_end]
        } else {
            &[][..]
        };

        let payload_start = header_end + HEADER_TERMINATOR.len();
        let payload_end = find(body, &self.separator, payload_start)?;

        let part = Part::from_headers(headers, &body[payload_start..payload_end]);
        if part.is_none() {
            debug!("Dropping multipart part without a name at byte {start}");
        }
        Some((part, payload_end + CRLF.len()))
    }
}

impl Iterator for MultipartReader<'_> {
    type Item = Part;

    fn next(&mut self) -> Option<Part> {
        loop {
            let start = self.position.take()?;
            let (part, next) = self.scan_part(start)?;
            self.position = Some(next);
            if let Some(part) = part {
                return Some(part);
            }
        }
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}
