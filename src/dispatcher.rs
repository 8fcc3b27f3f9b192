//! Accept loop and worker pool: one acceptor thread pushes accepted sockets
//! into a bounded queue; a fixed number of worker threads pop sockets off it
//! and handle one request end-to-end each. A handling error never kills a
//! worker — it only ends the current connection.

use crate::handlers::{handle_get, handle_put};
use crate::io_primitives::read_until_delimiter_or_fill;
use crate::listener::Listener;
use crate::logger::Logger;
use crate::queue::BoundedQueue;
use crate::registry::LockRegistry;
use crate::request::{parse_request, Method};
use crate::response::write_fixed;
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Read buffer for the header block. Must hold at least the largest
/// possible request line + headers; 8 KiB comfortably covers the grammar's
/// limits (63-byte path, 128-byte header names/values).
const HEADER_BUF_SIZE: usize = 8192;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Server {
    queue: Arc<BoundedQueue<TcpStream>>,
    registry: Arc<LockRegistry>,
    root: PathBuf,
    logger: Logger,
    num_workers: usize,
}

impl Server {
    pub fn new(num_workers: usize, root: PathBuf, logger: Logger) -> Self {
        Self {
            queue: Arc::new(BoundedQueue::new(num_workers)),
            registry: Arc::new(LockRegistry::new(1)),
            root,
            logger,
            num_workers,
        }
    }

    /// Spawns the worker pool and runs the accept loop on the calling
    /// thread forever. Only returns if `accept()` itself errors fatally.
    pub fn run(&self, listener: Listener) -> std::io::Result<()> {
        for id in 0..self.num_workers {
            let queue = self.queue.clone();
            let registry = self.registry.clone();
            let root = self.root.clone();
            let logger = self.logger.clone();
            thread::spawn(move || {
                worker_loop(id, queue, registry, root, logger);
            });
        }

        loop {
            match listener.accept() {
                Ok((stream, _peer)) => self.queue.push(stream),
                Err(e) => {
                    self.logger.warn(format!("accept() failed: {}", e));
                    continue;
                }
            }
        }
    }
}

fn worker_loop(
    id: usize,
    queue: Arc<BoundedQueue<TcpStream>>,
    registry: Arc<LockRegistry>,
    root: PathBuf,
    logger: Logger,
) {
    loop {
        let mut stream = queue.pop();
        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            logger.warn(format!("worker {}: set_read_timeout failed: {}", id, e));
        }
        if let Err(e) = handle_connection(&mut stream, &root, &registry, &logger) {
            logger.debug(format!("worker {}: connection ended with {}", id, e));
        }
        let _ = stream.shutdown(std::net::Shutdown::Both);
    }
}

fn handle_connection(
    stream: &mut TcpStream,
    root: &PathBuf,
    registry: &LockRegistry,
    logger: &Logger,
) -> std::io::Result<()> {
    let mut buf = bytes::BytesMut::zeroed(HEADER_BUF_SIZE);
    let n = read_until_delimiter_or_fill(stream, &mut buf, b"\r\n\r\n")?;
    let filled = buf.as_ref();

    let (req, header_len) = match parse_request(&filled[..n]) {
        Ok(parsed) => parsed,
        Err(_) => {
            // Malformed request: 400, no audit line.
            return write_fixed(stream, 400);
        }
    };
    let prebuf = &filled[header_len..n];

    if req.version != "HTTP/1.1" {
        return write_fixed(stream, 505);
    }

    match req.method {
        Method::Get => handle_get(stream, &req, prebuf, root, registry, logger),
        Method::Put => handle_put(stream, &req, prebuf, root, registry, logger),
        Method::Other(_) => write_fixed(stream, 501),
    }
}
