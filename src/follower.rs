//! Blocking reader over the bytes appended to a followed file.

use crate::config::FollowConfig;
use crate::error::{Error, Result};
use crate::queue::{Chunk, ChunkSender, HandoffQueue};
use crate::watcher::{DirectoryWatcher, StopFlag};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tracing::debug;

/// Resolve `path` to the absolute file identity that gets followed.
pub(crate) fn resolve_target<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    // No file can be named with a NUL byte
    if path.is_dir() || path.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(Error::InvalidTarget {
            path: path.to_path_buf(),
        });
    }
    Ok(std::path::absolute(path)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Unstarted,
    Active,
    Closed,
}

/// The chunk currently being served and the position of the next byte in it.
#[derive(Debug, Default)]
struct ReaderCursor {
    buffer: Vec<u8>,
    position: Option<usize>,
}

impl ReaderCursor {
    fn load(&mut self, buffer: Vec<u8>) {
        self.position = if buffer.is_empty() { None } else { Some(0) };
        self.buffer = buffer;
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.position = None;
    }

    fn remaining(&self) -> usize {
        self.position
            .map_or(0, |position| self.buffer.len() - position)
    }

    fn next_byte(&mut self) -> Option<u8> {
        let position = self.position?;
        let byte = self.buffer[position];
        self.advance(1);
        Some(byte)
    }

    /// Copy as much of the current chunk as fits into `out`.
    fn copy_into(&mut self, out: &mut [u8]) -> usize {
        let Some(position) = self.position else {
            return 0;
        };
        let count = out.len().min(self.buffer.len() - position);
        out[..count].copy_from_slice(&self.buffer[position..position + count]);
        self.advance(count);
        count
    }

    fn advance(&mut self, count: usize) {
        if let Some(position) = self.position {
            let next = position + count;
            self.position = (next < self.buffer.len()).then_some(next);
        }
    }
}

/// Closes a [`FollowingReader`] from another thread, unblocking a pending read.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    queue: ChunkSender,
    stop: StopFlag,
}

impl CloseHandle {
    pub(crate) fn new(queue: ChunkSender, stop: StopFlag) -> Self {
        Self { queue, stop }
    }

    /// Stops the watcher and ends the stream. Safe to call repeatedly.
    pub fn close(&self) {
        if self.stop.request() {
            self.queue.push(Chunk::End);
        }
    }
}

/// Follows a file the way `tail -f` does, as a blocking [`Read`].
///
/// Nothing is watched until the first read, which starts a background
/// watcher thread and waits for it to be live. From then on every byte
/// appended to the file is returned exactly once, in order. Truncation and
/// rotation restart the stream at the new content. Reads block while no new
/// bytes are available and return end-of-data only once the reader has been
/// closed or the watcher has died.
///
/// The reader is forward only and must not be driven from inside an async
/// runtime; use [`FollowingStream`](crate::FollowingStream) there.
pub struct FollowingReader {
    file_path: PathBuf,
    config: FollowConfig,
    queue: HandoffQueue,
    closer: CloseHandle,
    state: ReaderState,
    cursor: ReaderCursor,
    watcher_thread: Option<JoinHandle<()>>,
}

impl FollowingReader {
    /// Creates a reader for `path`. Fails if the path is a directory or contains a NUL byte.
    pub fn new<P: AsRef<Path>>(path: P, config: FollowConfig) -> Result<Self> {
        let file_path = resolve_target(path)?;
        let (sender, queue) = HandoffQueue::new();

        Ok(Self {
            file_path,
            config,
            queue,
            closer: CloseHandle::new(sender, StopFlag::default()),
            state: ReaderState::Unstarted,
            cursor: ReaderCursor::default(),
            watcher_thread: None,
        })
    }

    /// The absolute path being followed.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// A handle that can close this reader while it is blocked in a read.
    pub fn closer(&self) -> CloseHandle {
        self.closer.clone()
    }

    /// Returns the next byte, blocking until one is appended, or `None` at
    /// end-of-data. Once `None` is returned it is returned forever.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        loop {
            if let Some(byte) = self.cursor.next_byte() {
                return Ok(Some(byte));
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Number of bytes that can be read without blocking.
    pub fn available(&self) -> usize {
        self.cursor.remaining()
    }

    /// Stops following. Idempotent; subsequent reads return end-of-data.
    pub fn close(&mut self) {
        if self.state == ReaderState::Closed {
            return;
        }
        debug!("[follower] closing {}", self.file_path.display());
        self.closer.close();
        self.state = ReaderState::Closed;
        self.cursor.clear();
    }

    /// Loads the next non-empty chunk, blocking if needed. Returns `false`
    /// once the stream has ended.
    fn fill(&mut self) -> Result<bool> {
        loop {
            if self.state == ReaderState::Closed {
                return Ok(false);
            }
            self.start()?;

            match self.queue.pop() {
                Some(Chunk::Data(bytes)) => {
                    if bytes.is_empty() {
                        continue;
                    }
                    self.cursor.load(bytes);
                    return Ok(true);
                }
                Some(Chunk::End) | None => {
                    debug!("[follower] end of {}", self.file_path.display());
                    self.state = ReaderState::Closed;
                    self.cursor.clear();
                    return Ok(false);
                }
            }
        }
    }

    /// Starts watching now instead of on the first read, returning once the
    /// watch is live. Bytes appended after this returns will be delivered.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ReaderState::Unstarted {
            return Ok(());
        }
        self.state = ReaderState::Active;

        // Closed before the first read: the end marker is already queued
        if self.closer.stop.is_requested() {
            return Ok(());
        }

        let (watcher, ready) = DirectoryWatcher::new(
            self.file_path.clone(),
            self.config.clone(),
            self.closer.queue.clone(),
            self.closer.stop.clone(),
        );
        self.watcher_thread = Some(watcher.spawn_thread()?);

        if ready.blocking_recv().is_err() {
            debug!(
                "[follower] watcher for {} exited before becoming ready",
                self.file_path.display()
            );
        }
        Ok(())
    }

    #[cfg(test)]
    fn watcher_finished(&self) -> bool {
        self.watcher_thread
            .as_ref()
            .is_none_or(|handle| handle.is_finished())
    }
}

impl Read for FollowingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.cursor.remaining() == 0 && !self.fill()? {
            return Ok(0);
        }
        Ok(self.cursor.copy_into(buf))
    }
}

impl Drop for FollowingReader {
    fn drop(&mut self) {
        self.close();
    }
}
