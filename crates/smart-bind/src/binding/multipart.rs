//! Minimal `multipart/form-data` parser.

use std::fmt;

use crate::source::{FilePart, FormData};

#[derive(Debug)]
pub(crate) enum MultipartError {
    MissingBoundary,
    TooLarge { limit: usize },
    Malformed(&'static str),
}

impl fmt::Display for MultipartError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBoundary => formatter.write_str("no multipart boundary param in Content-Type"),
            Self::TooLarge { limit } => {
                write!(formatter, "multipart body exceeds the limit of {limit} bytes")
            }
            Self::Malformed(reason) => write!(formatter, "malformed multipart body: {reason}"),
        }
    }
}

impl std::error::Error for MultipartError {}

/// Returns the lowercased media type from a `Content-Type` value, without params.
pub(crate) fn media_type(content_type: &str) -> String {
    let media_type = content_type.split(';').next().unwrap_or(content_type);
    media_type.trim().to_ascii_lowercase()
}

/// Extracts a param (e.g., `boundary`) from a header value like `multipart/form-data; boundary=xyz`.
fn header_param<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case(name) {
            return None;
        }
        let value = value.trim();
        Some(
            value
                .strip_prefix('"')
                .and_then(|value| value.strip_suffix('"'))
                .unwrap_or(value),
        )
    })
}

pub(crate) fn boundary(content_type: &str) -> Result<&str, MultipartError> {
    if media_type(content_type) != "multipart/form-data" {
        return Err(MultipartError::MissingBoundary);
    }
    header_param(content_type, "boundary")
        .filter(|boundary| !boundary.is_empty())
        .ok_or(MultipartError::MissingBoundary)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[derive(Debug, Default)]
struct PartHeaders {
    name: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
}

impl PartHeaders {
    fn parse(raw: &[u8]) -> Result<Self, MultipartError> {
        let raw = std::str::from_utf8(raw)
            .map_err(|_| MultipartError::Malformed("part headers are not UTF-8"))?;
        let mut headers = Self::default();
        for line in raw.split("\r\n").filter(|line| !line.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or(MultipartError::Malformed("part header without a colon"))?;
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-disposition") {
                headers.name = header_param(value, "name").map(str::to_owned);
                headers.filename = header_param(value, "filename").map(str::to_owned);
            } else if name.eq_ignore_ascii_case("content-type") {
                headers.content_type = Some(value.to_owned());
            }
        }
        Ok(headers)
    }
}

/// Parses a multipart body into form values and files. Parts without a name are skipped.
pub(crate) fn parse(body: &[u8], boundary: &str, max_memory: usize) -> Result<FormData, MultipartError> {
    if body.len() > max_memory {
        return Err(MultipartError::TooLarge { limit: max_memory });
    }

    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let part_end = format!("\r\n--{boundary}");
    let part_end = part_end.as_bytes();

    let start = find(body, delimiter).ok_or(MultipartError::Malformed("no opening boundary"))?;
    let mut rest = &body[start + delimiter.len()..];
    let mut form = FormData::default();
    loop {
        if rest.starts_with(b"--") {
            return Ok(form);
        }
        rest = rest
            .strip_prefix(b"\r\n")
            .ok_or(MultipartError::Malformed("boundary is not followed by CRLF"))?;

        let headers_end =
            find(rest, b"\r\n\r\n").ok_or(MultipartError::Malformed("unterminated part headers"))?;
        let headers = PartHeaders::parse(&rest[..headers_end])?;
        rest = &rest[headers_end + 4..];

        let content_end = find(rest, part_end).ok_or(MultipartError::Malformed("no closing boundary"))?;
        let content = &rest[..content_end];
        rest = &rest[content_end + part_end.len()..];

        let Some(field_name) = headers.name else {
            tracing::trace!("skipping multipart part without a name");
            continue;
        };
        if let Some(filename) = headers.filename {
            form.append_file(FilePart {
                field_name,
                filename: Some(filename),
                content_type: headers.content_type,
                data: content.to_vec(),
            });
        } else {
            form.append(field_name, String::from_utf8_lossy(content));
        }
    }
}
