use std::fmt;
use std::io;

/// Custom error type for tegrows operations
#[derive(Debug)]
pub enum Error {
    /// I/O error from underlying file operations
    Io(io::Error),
    /// The session provider could not hand out a session
    Acquisition(String),
    /// Query execution or row decoding failed after a session was acquired
    Query(String),
    /// Releasing a cursor or session failed
    Release(String),
    /// A caller broke an operation contract, e.g. a zero batch size
    InvalidArgument(String),
    /// Error during SQL parsing
    Parse(String),
    /// Table not found
    TableNotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Acquisition(msg) => write!(f, "Could not acquire session: {msg}"),
            Error::Query(msg) => write!(f, "Query failed: {msg}"),
            Error::Release(msg) => write!(f, "Release failed: {msg}"),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Error::Parse(msg) => write!(f, "SQL parse error: {msg}"),
            Error::TableNotFound(table) => write!(f, "Table '{table}' not found"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Result type for tegrows operations
pub type Result<T> = std::result::Result<T, Error>;
