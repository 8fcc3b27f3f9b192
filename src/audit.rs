//! The per-request audit trail: one CSV-shaped line per handled request on
//! standard error, written after the response status is known. Deliberately
//! distinct from the diagnostic logger in `crate::logger` — this is
//! protocol-meaningful output, not an operational log, and it is emitted
//! with a single `write_all` call so a line never interleaves with another
//! worker's line on the shared stderr handle.

use std::io::{self, Write};

/// Writes one audit line: `METHOD,/PATH,STATUS,REQUEST_ID\n`.
///
/// Only called once a request has survived parsing and its method/path are
/// known, and only for dispositions that reach a method handler's state
/// machine (not for malformed requests, semantic precondition failures,
/// version mismatches, or unknown methods).
pub fn log(method: &str, path: &str, status: u16, request_id: i64) {
    let line = format!("{},/{},{},{}\n", method, path, status, request_id);
    let _ = io::stderr().write_all(line.as_bytes());
}
