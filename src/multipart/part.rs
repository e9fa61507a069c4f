//! Decoded multipart parts and their header parsing

/// Content type assumed for parts that do not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// One named field or file extracted from a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    /// Present only for file parts
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// Payload as text, for plain fields.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Builds a part from its raw header block, or `None` when the
    /// disposition carries no `name`.
    pub(crate) fn from_headers(headers: &[u8], data: &[u8]) -> Option<Part> {
        let headers = String::from_utf8_lossy(headers);
        let mut disposition = None;
        let mut content_type = None;

        for line in headers.split("\r\n") {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            match name.trim().to_ascii_lowercase().as_str() {
                "content-disposition" => disposition = Some(value.trim().to_string()),
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let params = disposition_params(&disposition?);
        let mut name = None;
        let mut filename = None;
        for (key, value) in params {
            match key.as_str() {
                "name" => name = Some(value),
                "filename" => filename = Some(value),
                _ => {}
            }
        }

        Some(Part {
            name: name?,
            filename,
            content_type: content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            data: data.to_vec(),
        })
    }
}

/// Splits `form-data; name="a"; filename="b;c.txt"` into lowercase keys and
/// unquoted values. Semicolons inside quotes do not split.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in value.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
        .iter()
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            Some((key.trim().to_ascii_lowercase(), unquote(value.trim())))
        })
        .collect()
}

fn unquote(value: &str) -> String {
    match value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_part_headers() {
        let headers = b"Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
                        Content-Type: application/pdf";
        let part = Part::from_headers(headers, b"hello").unwrap();
        assert_eq!(part.name, "file");
        assert_eq!(part.filename.as_deref(), Some("a.txt"));
        assert_eq!(part.content_type, "application/pdf");
        assert_eq!(part.data, b"hello");
        assert!(part.is_file());
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let headers = b"content-DISPOSITION: form-data; NAME=path";
        let part = Part::from_headers(headers, b"docs").unwrap();
        assert_eq!(part.name, "path");
        assert_eq!(part.content_type, DEFAULT_CONTENT_TYPE);
        assert!(!part.is_file());
        assert_eq!(part.text(), "docs");
    }

    #[test]
    fn quoted_semicolons_and_escapes_survive() {
        let headers = br#"Content-Disposition: form-data; name="f"; filename="a;b \"c\".txt""#;
        let part = Part::from_headers(headers, b"").unwrap();
        assert_eq!(part.filename.as_deref(), Some("a;b \"c\".txt"));
    }

    #[test]
    fn missing_name_drops_the_part() {
        assert!(Part::from_headers(b"Content-Disposition: form-data; filename=\"x\"", b"").is_none());
        assert!(Part::from_headers(b"Content-Type: text/plain", b"").is_none());
    }
}
