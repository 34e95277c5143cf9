//! Error types for SDK packaging

use std::path::PathBuf;
use thiserror::Error;

pub type PackResult<T> = Result<T, PackError>;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid ignore pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Invalid substitution pattern: {0}")]
    Regex(#[from] regex::Error),

    /// A file or directory the layout needs is not in the checkout
    #[error("Missing SDK input: {0}")]
    MissingSource(PathBuf),

    /// `io_sources.gypi` without a usable `sources` list
    #[error("Invalid sources list {file}: {message}")]
    SourcesList { file: PathBuf, message: String },
}
