//! End-to-end tests driving the server over real loopback TCP sockets,
//! covering the core request/response scenarios and a handful of boundary
//! cases. `TempDirGuard` follows the same temp-directory-per-test pattern
//! used by the crate's other integration tests.

use flatfiled::dispatcher::Server;
use flatfiled::listener::Listener;
use flatfiled::logger::init_logger;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

struct TempDirGuard(PathBuf);

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let mut p = std::env::temp_dir();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        p.push(format!("{}_{}_{}", prefix, std::process::id(), ts));
        std::fs::create_dir_all(&p).unwrap();
        TempDirGuard(p)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Spawns a server with `num_workers` over a fresh temp working directory
/// and returns the address clients should connect to.
fn spawn_server(num_workers: usize) -> (SocketAddr, TempDirGuard) {
    let tmp = TempDirGuard::new("flatfiled_integration");
    let (logger, _log_handle) = init_logger(None);
    let listener = Listener::bind_on(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)).unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(Server::new(num_workers, tmp.path().to_path_buf(), logger));
    thread::spawn(move || {
        let _ = server.run(listener);
    });
    (addr, tmp)
}

fn roundtrip(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request).unwrap();
    stream.shutdown(std::net::Shutdown::Write).ok();
    let mut resp = Vec::new();
    stream.read_to_end(&mut resp).unwrap();
    resp
}

fn split_head_body(resp: &[u8]) -> (String, &[u8]) {
    let marker = b"\r\n\r\n";
    let pos = resp
        .windows(marker.len())
        .position(|w| w == marker)
        .expect("response must contain a header/body separator");
    (
        String::from_utf8_lossy(&resp[..pos]).to_string(),
        &resp[pos + 4..],
    )
}

#[test]
fn s1_put_then_get() {
    let (addr, _tmp) = spawn_server(4);

    let resp = roundtrip(addr, b"PUT /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
    let (head, body) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 201 Created"));
    assert!(head.contains("Content-Length: 8"));
    assert_eq!(body, b"Created\n");

    let resp = roundtrip(addr, b"GET /a HTTP/1.1\r\n\r\n");
    let (head, body) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Length: 5"));
    assert_eq!(body, b"hello");
}

#[test]
fn s2_overwrite_returns_200() {
    let (addr, _tmp) = spawn_server(4);

    roundtrip(addr, b"PUT /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");

    let resp = roundtrip(
        addr,
        b"PUT /a HTTP/1.1\r\nContent-Length: 3\r\nRequest-Id: 7\r\n\r\nHI!",
    );
    let (head, body) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(body, b"OK\n");

    let resp = roundtrip(addr, b"GET /a HTTP/1.1\r\n\r\n");
    let (_, body) = split_head_body(&resp);
    assert_eq!(body, b"HI!");
}

#[test]
fn s3_missing_file_is_404() {
    let (addr, _tmp) = spawn_server(4);

    let resp = roundtrip(addr, b"GET /nope HTTP/1.1\r\n\r\n");
    let (head, body) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 404 Not Found"));
    assert!(head.contains("Content-Length: 10"));
    assert_eq!(body, b"Not Found\n");
}

#[test]
fn s4_unknown_method_is_501() {
    let (addr, _tmp) = spawn_server(4);

    let resp = roundtrip(addr, b"DELETE /a HTTP/1.1\r\n\r\n");
    let (head, body) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 501 Not Implemented"));
    assert_eq!(body, b"Not Implemented\n");
}

#[test]
fn s5_version_mismatch_is_505() {
    let (addr, _tmp) = spawn_server(4);

    let resp = roundtrip(addr, b"GET /a HTTP/2.0\r\n\r\n");
    let (head, body) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 505 Version Not Supported"));
    assert_eq!(body, b"Version Not Supported\n");
}

#[test]
fn s6_concurrent_distinct_paths_all_succeed_with_exact_payloads() {
    let (addr, _tmp) = spawn_server(8);

    const N: usize = 16;
    const SIZE: usize = 64 * 1024; // smaller than 1 MiB to keep the test fast

    let put_handles: Vec<_> = (0..N)
        .map(|i| {
            thread::spawn(move || {
                let payload = vec![i as u8; SIZE];
                let mut req = format!("PUT /f{} HTTP/1.1\r\nContent-Length: {}\r\n\r\n", i, SIZE)
                    .into_bytes();
                req.extend_from_slice(&payload);
                let resp = roundtrip(addr, &req);
                let (head, _) = split_head_body(&resp);
                assert!(head.starts_with("HTTP/1.1 201 Created"), "put {} got: {}", i, head);
            })
        })
        .collect();
    for h in put_handles {
        h.join().unwrap();
    }

    let get_handles: Vec<_> = (0..N)
        .map(|i| {
            thread::spawn(move || {
                let req = format!("GET /f{} HTTP/1.1\r\n\r\n", i).into_bytes();
                let resp = roundtrip(addr, &req);
                let (head, body) = split_head_body(&resp);
                assert!(head.starts_with("HTTP/1.1 200 OK"), "get {} got: {}", i, head);
                assert!(
                    body.iter().all(|&b| b == i as u8) && body.len() == SIZE,
                    "get {} did not return its exact payload (no cross-path mixing)",
                    i
                );
            })
        })
        .collect();
    for h in get_handles {
        h.join().unwrap();
    }
}

#[test]
fn concurrent_put_winner_is_never_a_splice_of_two_payloads() {
    let (addr, _tmp) = spawn_server(4);

    // Seed the file so both racing PUTs take the "overwrite" path.
    roundtrip(addr, b"PUT /race HTTP/1.1\r\nContent-Length: 1\r\n\r\nx");

    const SIZE: usize = 32 * 1024;
    let p1 = vec![1u8; SIZE];
    let p2 = vec![2u8; SIZE];

    let mut req1 = format!("PUT /race HTTP/1.1\r\nContent-Length: {}\r\n\r\n", SIZE).into_bytes();
    req1.extend_from_slice(&p1);
    let mut req2 = req1[..req1.len() - SIZE].to_vec();
    req2.extend_from_slice(&p2);

    let h1 = thread::spawn(move || roundtrip(addr, &req1));
    let h2 = thread::spawn(move || roundtrip(addr, &req2));
    let r1 = h1.join().unwrap();
    let r2 = h2.join().unwrap();
    assert!(split_head_body(&r1).0.starts_with("HTTP/1.1 200 OK"));
    assert!(split_head_body(&r2).0.starts_with("HTTP/1.1 200 OK"));

    let resp = roundtrip(addr, b"GET /race HTTP/1.1\r\n\r\n");
    let (_, body) = split_head_body(&resp);
    assert!(
        body == p1.as_slice() || body == p2.as_slice(),
        "winning payload must be exactly one writer's payload, never a mix"
    );
}

#[test]
fn malformed_request_creates_no_file_and_closes_without_a_400_audit_line() {
    let (addr, tmp) = spawn_server(4);

    // Missing the blank-line terminator: never completes the header grammar.
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"GET /a HTTP/1.1\r\n").unwrap();
    stream.shutdown(std::net::Shutdown::Write).ok();
    let mut resp = Vec::new();
    let _ = stream.read_to_end(&mut resp);
    let (head, _) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 400 Bad Request"));

    assert!(!tmp.path().join("a").exists());
}

#[test]
fn put_with_content_length_zero_creates_empty_file() {
    let (addr, tmp) = spawn_server(4);

    let resp = roundtrip(addr, b"PUT /empty HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
    let (head, _) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 201 Created"));
    assert_eq!(std::fs::metadata(tmp.path().join("empty")).unwrap().len(), 0);
}

#[test]
fn path_of_64_chars_is_rejected_as_400() {
    let (addr, _tmp) = spawn_server(4);

    let path = "a".repeat(64);
    let req = format!("GET /{} HTTP/1.1\r\n\r\n", path);
    let resp = roundtrip(addr, req.as_bytes());
    let (head, _) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 400 Bad Request"));
}

#[test]
fn put_on_an_existing_directory_is_403() {
    let (addr, tmp) = spawn_server(4);
    std::fs::create_dir(tmp.path().join("adir")).unwrap();

    let resp = roundtrip(addr, b"PUT /adir HTTP/1.1\r\nContent-Length: 1\r\n\r\nx");
    let (head, _) = split_head_body(&resp);
    assert!(head.starts_with("HTTP/1.1 403 Forbidden"));
}
