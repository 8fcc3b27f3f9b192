use std::fmt::{Debug, Display, Formatter};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// An error carrying its own source location, in the style of an assertion
/// message: cheap to construct, useful in the diagnostic log without a
/// backtrace.
pub struct ServerError {
    msg: String,
    file: &'static str,
    line: u32,
    source: Option<Error>,
}

impl ServerError {
    pub fn new(msg: impl Into<String>, file: &'static str, line: u32, source: Option<Error>) -> Self {
        Self {
            msg: msg.into(),
            file,
            line,
            source,
        }
    }
}

#[macro_export]
macro_rules! server_error {
    ($fmt:expr $(, $($args:tt)*)?) => {
        $crate::err::ServerError::new(format!($fmt $(,$($args)*)?), file!(), line!(), None)
    };
}

#[macro_export]
macro_rules! server_error_with_source {
    ($source:expr, $fmt:expr $(, $($args:tt)*)?) => {
        $crate::err::ServerError::new(
            format!($fmt $(,$($args)*)?),
            file!(), line!(),
            Some(Box::new($source) as $crate::err::Error),
        )
    };
}

impl Debug for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]:{} {}", self.file, self.line, self.msg)
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
