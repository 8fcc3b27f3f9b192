//! Background-thread diagnostic logger.
//!
//! Adapted from an async channel-fed file logger to the blocking-thread
//! model this crate uses throughout: a single writer thread drains a
//! `std::sync::mpsc` channel and appends timestamped lines to a file (or
//! stderr, if no file was configured). This is operational logging only —
//! it carries no protocol meaning and is independent of the per-request
//! audit trail (see `crate::audit`).

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::ops::Deref;
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "\x1b[36mTRACE\x1b[0m",
            LogLevel::Debug => "\x1b[34mDEBUG\x1b[0m",
            LogLevel::Info => "INFO ",
            LogLevel::Warn => "\x1b[33mWARN \x1b[0m",
            LogLevel::Error => "\x1b[31mERROR\x1b[0m",
        };
        write!(f, "{}", s)
    }
}

enum LogRecord {
    Message { level: LogLevel, msg: String, ts_millis: i64 },
    Shutdown,
}

impl LogRecord {
    fn format_line(&self) -> Option<String> {
        match self {
            LogRecord::Message { level, msg, ts_millis } => {
                let dt = chrono::DateTime::from_timestamp_millis(*ts_millis).unwrap_or_else(Utc::now);
                let ts = dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
                Some(format!("{} [{}] {}\n", ts, level, msg))
            }
            LogRecord::Shutdown => None,
        }
    }
}

/// A logger handle; cloning shares the same background writer thread.
#[derive(Clone)]
pub struct Logger {
    tx: mpsc::Sender<LogRecord>,
}

impl Logger {
    fn log(&self, level: LogLevel, msg: impl Into<String>) {
        let rec = LogRecord::Message {
            level,
            msg: msg.into(),
            ts_millis: Utc::now().timestamp_millis(),
        };
        // Best effort: a full or closed channel must never block or panic a worker.
        let _ = self.tx.send(rec);
    }

    pub fn trace(&self, msg: impl Into<String>) {
        self.log(LogLevel::Trace, msg);
    }
    pub fn debug(&self, msg: impl Into<String>) {
        self.log(LogLevel::Debug, msg);
    }
    pub fn info(&self, msg: impl Into<String>) {
        self.log(LogLevel::Info, msg);
    }
    pub fn warn(&self, msg: impl Into<String>) {
        self.log(LogLevel::Warn, msg);
    }
    pub fn error(&self, msg: impl Into<String>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(LogRecord::Shutdown);
    }
}

/// Spawns the background writer thread. `path = None` writes to stderr.
pub fn init_logger(path: Option<std::path::PathBuf>) -> (Logger, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<LogRecord>();

    let handle = std::thread::spawn(move || {
        let mut file = path.as_ref().and_then(|p| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
        });

        while let Ok(rec) = rx.recv() {
            match rec {
                LogRecord::Shutdown => break,
                other => {
                    if let Some(line) = other.format_line() {
                        match file.as_mut() {
                            Some(f) => {
                                let _ = f.write_all(line.as_bytes());
                                let _ = f.flush();
                            }
                            None => {
                                let _ = std::io::stderr().write_all(line.as_bytes());
                            }
                        }
                    }
                }
            }
        }
    });

    (Logger { tx }, handle)
}

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Installs the process-wide logger. Must be called at most once; subsequent
/// calls are ignored so tests that run in-process don't race each other.
pub fn install(logger: Logger) {
    let _ = GLOBAL.set(logger);
}

pub struct GlobalLogger;

impl Deref for GlobalLogger {
    type Target = Logger;

    fn deref(&self) -> &Self::Target {
        GLOBAL.get_or_init(|| init_logger(None).0)
    }
}

pub static LOGGER: GlobalLogger = GlobalLogger;

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;

    #[test]
    fn writes_lines_to_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("flatfiled_logger_test_{}.log", std::process::id()));
        let (logger, handle) = init_logger(Some(path.clone()));

        logger.info("hello info");
        logger.warn("be careful");
        logger.shutdown();
        handle.join().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[INFO ] hello info"));
        assert!(content.contains("be careful"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn shutdown_stops_background_thread() {
        let (logger, handle) = init_logger(None);
        logger.trace("x");
        logger.shutdown();
        // Should join promptly; if the thread ignored Shutdown this would hang the test.
        let joined = std::thread::spawn(move || handle.join());
        std::thread::sleep(Duration::from_millis(10));
        assert!(joined.join().unwrap().is_ok());
    }

    // GLOBAL is a process-wide OnceLock; install() is a no-op after the
    // first call, so this test must not race another test's install().
    #[test]
    #[serial]
    fn install_is_idempotent_and_global_logger_is_reachable() {
        let (logger, _handle) = init_logger(None);
        install(logger);
        LOGGER.info("reachable through the global handle");

        let (other, _other_handle) = init_logger(None);
        install(other); // ignored: GLOBAL already set
    }
}
