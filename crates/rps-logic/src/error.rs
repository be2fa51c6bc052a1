//! Error types for the RPS crate

use thiserror::Error;

/// Main error type for the RPS crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid move '{value}' (expected rock, paper or scissors)")]
    InvalidMove { value: String },

    #[error("unknown bot '{name}'")]
    UnknownBot { name: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("input closed before a move was entered")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
