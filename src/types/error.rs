use thiserror::Error;

/// navaja error types
#[derive(Error, Debug)]
pub enum NavajaError {
    /// Transport failure: connection error, timeout, body read
    #[error("request error: {0}")]
    Request(String),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Body was not valid JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The subscription was torn down while a cycle was in flight
    #[error("refresh cancelled")]
    Cancelled,
}

/// Result type alias for navaja
pub type Result<T> = std::result::Result<T, NavajaError>;
