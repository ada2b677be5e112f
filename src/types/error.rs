use std::io;

use thiserror::Error;

use crate::cursor::CursorKind;

/// Errors surfaced by the cursor layer and its backing record store.
#[derive(Debug, Error)]
pub enum SombraError {
    /// Underlying I/O failure reported by the store.
    #[error("IO: {0}")]
    Io(#[from] io::Error),
    /// A record or chain pointer is inconsistent.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Caller supplied an argument the layer cannot represent.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// The requested record does not exist or is not in use.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A cursor kind was acquired while a previous acquisition was still open.
    #[error("{0} cursor acquired while a previous acquisition is still open")]
    PoolMisuse(CursorKind),
    /// Configuration or logging setup failed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SombraError>;
