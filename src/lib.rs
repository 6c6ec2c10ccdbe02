//! A file follower library: read the bytes appended to a file as they are
//! written, like `tail -f`.
//!
//! The parent directory of the file is watched for change notifications. Each
//! time the file grows, only the newly appended bytes are handed to the
//! consumer. Truncation and rotation are detected by comparing the file's size
//! with the last observed size.
//!
//! Two front ends share the same watcher:
//!
//! * [`FollowingReader`] is a blocking [`std::io::Read`] for synchronous code.
//! * [`FollowingStream`] is a [`futures::Stream`] of byte chunks for async code.
//!
//! # Example
//!
//! ```rust,no_run
//! use file_follower::follow_file;
//! use std::io::Read;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut reader = follow_file("app.log", None)?;
//!     let mut buffer = [0u8; 1024];
//!
//!     loop {
//!         let nread = reader.read(&mut buffer)?;
//!         if nread == 0 {
//!             break;
//!         }
//!         print!("{}", String::from_utf8_lossy(&buffer[..nread]));
//!     }
//!
//!     Ok(())
//! }
//! ```

// Internal modules - not part of public API
mod config;
mod error;
mod follower;
mod queue;
mod reader;
mod stream;
mod watcher;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::{
    DEFAULT_POLL_INTERVAL, DEFAULT_READ_BUFFER_SIZE, FollowConfig, MIN_POLL_INTERVAL, OverflowPolicy,
};
pub use error::{Error, Result};
pub use follower::{CloseHandle, FollowingReader};
pub use stream::FollowingStream;

use std::path::Path;

/// Creates a blocking reader over the bytes appended to `path`.
///
/// # Arguments
///
/// * `path` - File to follow; it does not have to exist yet
/// * `config` - Tuning options (defaults when `None`)
///
/// Fails with [`Error::InvalidTarget`] if `path` is a directory or contains
/// a NUL byte. Watching
/// starts on the first read.
pub fn follow_file<P: AsRef<Path>>(
    path: P,
    config: Option<FollowConfig>,
) -> Result<FollowingReader> {
    FollowingReader::new(path, config.unwrap_or_default())
}

/// Creates a stream that yields the bytes appended to `path`.
///
/// # Example
///
/// ```rust,no_run
/// use file_follower::watch_file;
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut stream = watch_file("app.log", None).await?;
///
///     while let Some(bytes) = stream.next().await {
///         print!("{}", String::from_utf8_lossy(&bytes));
///     }
///
///     Ok(())
/// }
/// ```
pub async fn watch_file<P: AsRef<Path>>(
    path: P,
    config: Option<FollowConfig>,
) -> Result<FollowingStream> {
    FollowingStream::new(path, config.unwrap_or_default()).await
}
