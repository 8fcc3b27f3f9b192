//! Command-line surface: `<prog> <port>` or `<prog> -t <N> <port>`. Shaped
//! after an `Opts`/`from_args` struct, but parsed by hand rather than
//! through `structopt`'s default error reporting, which would print a usage
//! banner where the contract here calls for a precise two-tier failure
//! mode:
//!
//! - wrong arity or an unrecognized flag ⇒ exit non-zero, **no** message;
//! - a recognized form with an unparsable `port` or `-t` count ⇒ exit
//!   non-zero with **exactly one** diagnostic line on stderr.

use std::process::ExitCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub port: u16,
    pub num_workers: usize,
}

const DEFAULT_WORKERS: usize = 4;

impl Opts {
    /// Parses `std::env::args()` (skipping argv[0]). On any grammar
    /// violation this prints nothing and the caller should exit non-zero;
    /// on a malformed value it prints one diagnostic line and the caller
    /// should exit non-zero.
    pub fn from_args() -> Result<Self, CliError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(&args)
    }

    fn parse(args: &[String]) -> Result<Self, CliError> {
        match args {
            [port] => {
                let port = parse_port(port)?;
                Ok(Opts {
                    port,
                    num_workers: DEFAULT_WORKERS,
                })
            }
            [flag, count, port] if flag == "-t" => {
                let num_workers = parse_worker_count(count)?;
                let port = parse_port(port)?;
                Ok(Opts { port, num_workers })
            }
            _ => Err(CliError::Silent),
        }
    }
}

/// A CLI failure: either silent (wrong arity, unrecognized flag) or
/// carrying exactly one diagnostic line to print before exiting.
#[derive(Debug)]
pub enum CliError {
    Silent,
    Diagnostic(String),
}

impl CliError {
    /// Prints the diagnostic (if any) and returns the process exit code:
    /// non-zero in both cases.
    pub fn report(self) -> ExitCode {
        if let CliError::Diagnostic(msg) = self {
            eprintln!("{}", msg);
        }
        ExitCode::FAILURE
    }
}

fn parse_port(s: &str) -> Result<u16, CliError> {
    s.parse::<u16>()
        .map_err(|_| CliError::Diagnostic(format!("invalid port: {}", s)))
}

fn parse_worker_count(s: &str) -> Result<usize, CliError> {
    match s.parse::<usize>() {
        Ok(0) => Err(CliError::Diagnostic(format!(
            "worker count must be positive: {}",
            s
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(CliError::Diagnostic(format!("invalid worker count: {}", s))),
    }
}
