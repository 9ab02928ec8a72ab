//! Error types for the folio content stream converter.

use thiserror::Error;

/// Primary error type for interpretation and emission.
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("matrix is not invertible (determinant {0})")]
    NotInvertible(f64),

    #[error("conversion cancelled")]
    Cancelled,

    #[error("nested content exceeds maximum depth of {0}")]
    NestingTooDeep(usize),

    #[error("resource not found: {kind} {name}")]
    ResourceNotFound { kind: &'static str, name: String },

    #[error("image error: {0}")]
    Image(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;
