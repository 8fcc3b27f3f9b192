//! Response-head construction for the fixed status set this server emits.
//!
//! Every response is `HTTP/1.1 <code> <reason>\r\nContent-Length: <n>\r\n\r\n`
//! followed by a body. For the small fixed-string responses (everything but
//! a successful GET) the body is just `"<reason>\n"`; a successful GET's
//! body is the file's bytes, streamed separately by the caller after
//! [`write_head`].

use crate::io_primitives::write_exact_n;
use std::io::{self, Write};

pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        505 => "Version Not Supported",
        _ => "Unknown",
    }
}

/// Writes a full response whose body is the fixed `"<reason>\n"` string.
pub fn write_fixed<W: Write>(stream: &mut W, code: u16) -> io::Result<()> {
    let reason = reason_phrase(code);
    let body = format!("{}\n", reason);
    write_head(stream, code, reason, body.len() as u64)?;
    write_exact_n(stream, body.as_bytes())
}

/// Writes just the response head, for callers that stream the body
/// themselves (a successful GET's file contents).
pub fn write_head<W: Write>(stream: &mut W, code: u16, reason: &str, content_length: u64) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n\r\n",
        code, reason, content_length
    );
    write_exact_n(stream, head.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_response_matches_declared_length() {
        let mut buf = Vec::new();
        write_fixed(&mut buf, 404).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with("Not Found\n"));
        assert!(text.contains("Content-Length: 10\r\n"));
    }

    #[test]
    fn head_only_has_no_body() {
        let mut buf = Vec::new();
        write_head(&mut buf, 200, "OK", 123).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "HTTP/1.1 200 OK\r\nContent-Length: 123\r\n\r\n");
    }
}
