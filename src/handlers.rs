//! The GET and PUT state machines.
//!
//! Each handler owns the full lifecycle for one request past the
//! version/method gate: precondition checks, the directory probe, lock
//! acquisition, the filesystem operation, response emission, and the audit
//! line. The path's rwlock is always released on every exit — it is held in
//! a guard whose `Drop` does the release, so an early `return` can never
//! leak it.

use crate::audit;
use crate::io_primitives::splice_n;
use crate::logger::Logger;
use crate::registry::LockRegistry;
use crate::request::Request;
use crate::response::{write_fixed, write_head};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// GET. `prebuf` is whatever body bytes the header read already consumed
/// from the socket — for GET this must be empty.
pub fn handle_get<S: io::Read + Write>(
    stream: &mut S,
    req: &Request,
    prebuf: &[u8],
    root: &Path,
    registry: &LockRegistry,
    logger: &Logger,
) -> io::Result<()> {
    if req.content_length.is_some() || !prebuf.is_empty() {
        return write_fixed(stream, 400);
    }

    let target = root.join(&req.path);

    if matches!(std::fs::metadata(&target), Ok(m) if m.is_dir()) {
        write_fixed(stream, 403)?;
        audit::log("GET", &req.path, 403, req.request_id);
        return Ok(());
    }

    let _guard = registry.acquire_read(&req.path);

    match File::open(&target) {
        Ok(mut file) => {
            let size = file.metadata()?.len();
            write_head(stream, 200, "OK", size)?;
            match splice_n(&mut file, stream, size as usize) {
                Ok(n) if n as u64 == size => {
                    audit::log("GET", &req.path, 200, req.request_id);
                }
                Ok(_) | Err(_) => {
                    // The 200 head is already on the wire; a second response
                    // would be invalid. Log internally and drop the connection.
                    logger.error(format!(
                        "GET /{}: I/O error while streaming body after response head was sent",
                        req.path
                    ));
                    audit::log("GET", &req.path, 200, req.request_id);
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            write_fixed(stream, 404)?;
            audit::log("GET", &req.path, 404, req.request_id);
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            write_fixed(stream, 403)?;
            audit::log("GET", &req.path, 403, req.request_id);
        }
        Err(_) => {
            write_fixed(stream, 500)?;
            audit::log("GET", &req.path, 500, req.request_id);
        }
    }
    Ok(())
}

/// PUT. `prebuf` holds whatever body bytes the header read
/// already pulled off the socket; they must be flushed to the file before
/// any further socket reads or the body is truncated by exactly that count.
pub fn handle_put<S: io::Read + Write>(
    stream: &mut S,
    req: &Request,
    prebuf: &[u8],
    root: &Path,
    registry: &LockRegistry,
    _logger: &Logger,
) -> io::Result<()> {
    let content_length = match req.content_length {
        Some(n) => n,
        None => return write_fixed(stream, 400),
    };

    let target = root.join(&req.path);

    if matches!(std::fs::metadata(&target), Ok(m) if m.is_dir()) {
        write_fixed(stream, 403)?;
        audit::log("PUT", &req.path, 403, req.request_id);
        return Ok(());
    }

    let _guard = registry.acquire_write(&req.path);

    let (status, mut file) = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(f) => (201u16, f),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            match OpenOptions::new().write(true).truncate(true).open(&target) {
                Ok(f) => (200u16, f),
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    write_fixed(stream, 403)?;
                    audit::log("PUT", &req.path, 403, req.request_id);
                    return Ok(());
                }
                Err(_) => {
                    write_fixed(stream, 500)?;
                    audit::log("PUT", &req.path, 500, req.request_id);
                    return Ok(());
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            write_fixed(stream, 403)?;
            audit::log("PUT", &req.path, 403, req.request_id);
            return Ok(());
        }
        Err(_) => {
            write_fixed(stream, 500)?;
            audit::log("PUT", &req.path, 500, req.request_id);
            return Ok(());
        }
    };

    let prebuf = &prebuf[..prebuf.len().min(content_length as usize)];
    let remaining = content_length - prebuf.len() as u64;

    let write_result = (|| -> io::Result<()> {
        file.write_all(prebuf)?;
        let moved = splice_n(stream, &mut file, remaining as usize)?;
        if moved as u64 != remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "client closed connection before declared Content-Length was reached",
            ));
        }
        Ok(())
    })();

    drop(file);

    match write_result {
        Ok(()) => {
            write_fixed(stream, status)?;
            audit::log("PUT", &req.path, status, req.request_id);
        }
        Err(_) => {
            write_fixed(stream, 500)?;
            audit::log("PUT", &req.path, 500, req.request_id);
        }
    }
    Ok(())
}
