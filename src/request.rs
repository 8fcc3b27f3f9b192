//! HTTP/1.1 request-line and header parsing: a request line, zero or more
//! headers, then a blank line. The input is already known to contain the
//! `\r\n\r\n` terminator (or parsing fails) — the caller supplies everything
//! it read up to and including the first occurrence of that delimiter, plus
//! whatever body bytes happened to come along in the same read.
//!
//! A `Content-Length` value that fails to parse aborts the whole parse on
//! the spot instead of returning a result and letting the caller keep
//! scanning headers. Continuing past a malformed header value would let a
//! worker write more than one response to the same socket, so the first
//! header-value error ends the parse. `Request-Id` is informational only —
//! a value that fails to parse just defaults to 0 rather than failing the
//! request.

use std::fmt;

const METHOD_MAX: usize = 8;
const PATH_MIN: usize = 1;
const PATH_MAX: usize = 63;
const HEADER_NAME_MAX: usize = 128;
const HEADER_VALUE_MAX: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Other(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
            Method::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// The leaf name, without the leading `/`.
    pub path: String,
    pub version: String,
    pub content_length: Option<u64>,
    pub request_id: i64,
}

/// A parse failure. The grammar gives no useful detail to recover from one
/// of these — every case maps to `400 Bad Request` with no audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed request")
    }
}

impl std::error::Error for ParseError {}

/// Parses the header block out of `buf`. Returns the request and the number
/// of bytes the header block occupied (including the terminating
/// `\r\n\r\n`); any bytes in `buf` beyond that count are pre-buffered body.
pub fn parse_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let terminator_at = find(buf, b"\r\n\r\n").ok_or(ParseError)?;
    let header_len = terminator_at + 4;
    // Everything up to and including the CRLF that closes the last header
    // (or the request line, if there are no headers).
    let head = std::str::from_utf8(&buf[..terminator_at + 2]).map_err(|_| ParseError)?;

    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or(ParseError)?;
    let (method, path, version) = parse_request_line(request_line)?;

    let mut content_length = None;
    let mut request_id = 0i64;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = parse_header(line)?;
        if name.eq_ignore_ascii_case("Content-Length") {
            content_length = Some(parse_non_negative_decimal(value).ok_or(ParseError)?);
        } else if name.eq_ignore_ascii_case("Request-Id") {
            request_id = value.parse::<i64>().unwrap_or(0);
        }
        // Any other header is accepted and ignored.
    }

    Ok((
        Request {
            method,
            path: path.to_string(),
            version: version.to_string(),
            content_length,
            request_id,
        },
        header_len,
    ))
}

fn parse_request_line(line: &str) -> Result<(Method, &str, &str), ParseError> {
    let mut parts = line.splitn(3, ' ');
    let method_str = parts.next().ok_or(ParseError)?;
    let target = parts.next().ok_or(ParseError)?;
    let version = parts.next().ok_or(ParseError)?;
    if parts.next().is_some() {
        return Err(ParseError);
    }

    if method_str.is_empty()
        || method_str.len() > METHOD_MAX
        || !method_str.bytes().all(|b| b.is_ascii_alphabetic())
    {
        return Err(ParseError);
    }
    let method = match method_str {
        "GET" => Method::Get,
        "PUT" => Method::Put,
        other => Method::Other(other.to_string()),
    };

    let path = target.strip_prefix('/').ok_or(ParseError)?;
    if path.len() < PATH_MIN || path.len() > PATH_MAX || !path.bytes().all(is_path_byte) {
        return Err(ParseError);
    }

    if !is_valid_version(version) {
        return Err(ParseError);
    }

    Ok((method, path, version))
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-'
}

fn is_valid_version(v: &str) -> bool {
    // "HTTP/" DIGIT "." DIGIT, exactly.
    let bytes = v.as_bytes();
    bytes.len() == 8
        && &bytes[..5] == b"HTTP/"
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'.'
        && bytes[7].is_ascii_digit()
}

fn parse_header(line: &str) -> Result<(&str, &str), ParseError> {
    let sep = line.find(": ").ok_or(ParseError)?;
    let name = &line[..sep];
    let value = &line[sep + 2..];
    if name.is_empty()
        || name.len() > HEADER_NAME_MAX
        || !name.bytes().all(|b| is_path_byte(b))
    {
        return Err(ParseError);
    }
    if value.is_empty()
        || value.len() > HEADER_VALUE_MAX
        || !value.bytes().all(|b| (0x20..=0x7e).contains(&b))
    {
        return Err(ParseError);
    }
    Ok((name, value))
}

fn parse_non_negative_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    lexical_core::parse::<u64>(s.as_bytes()).ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
