//! Thin wrapper over `std::net::TcpListener` (bind / bind_on / local_addr /
//! accept) over blocking sockets: one acceptor thread per listener and real
//! OS thread blocking rather than task multiplexing, so there is no async
//! reactor to hang this off of.

use crate::err::Result;
use crate::logger::Logger;
use crate::server_error_with_source;
use std::net::{SocketAddr, TcpListener as StdTcpListener, TcpStream};

pub struct Listener {
    inner: StdTcpListener,
}

impl Listener {
    /// Binds the listening port. Failure here is fatal to startup (the
    /// process exits non-zero if the port can't be bound), so it carries
    /// source-location context via the crate's error type rather than a
    /// bare `io::Error`.
    pub fn bind(port: u16, logger: &Logger) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        logger.info(format!("binding TCP listener to {}", addr));
        let inner = StdTcpListener::bind(addr)
            .map_err(|e| server_error_with_source!(e, "failed to bind {}", addr))?;
        Ok(Self { inner })
    }

    /// Binds to an explicit address — an ephemeral port (`:0`) is handy for
    /// tests that need a real socket without claiming a fixed port.
    pub fn bind_on(addr: SocketAddr) -> std::io::Result<Self> {
        Ok(Self {
            inner: StdTcpListener::bind(addr)?,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accepts one connection, blocking the calling thread until a peer
    /// connects or the underlying `accept()` call errors.
    pub fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        self.inner.accept()
    }
}
