//! Error handling for the tracer
//!
//! One crate-level error type; the protocol-level framing errors live
//! with the demultiplexer and never propagate past a connection.

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xtap
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<crate::trace::filter::FilterParseError> for Error {
    fn from(err: crate::trace::filter::FilterParseError) -> Self {
        Error::Config(err.to_string())
    }
}
