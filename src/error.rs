//! Error types for the file follower library.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for file follower operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading the followed file or spawning the watcher.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// The path names something that cannot be followed, such as a directory.
    #[error("{}: must be a file", .path.display())]
    InvalidTarget { path: PathBuf },
}

/// A convenient Result type for file follower operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            Error::InvalidTarget { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
            }
            other => std::io::Error::other(other),
        }
    }
}
