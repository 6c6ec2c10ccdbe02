//! Async stream of the chunks appended to a followed file.

use crate::config::FollowConfig;
use crate::error::Result;
use crate::follower::{CloseHandle, resolve_target};
use crate::queue::{Chunk, HandoffQueue};
use crate::watcher::{DirectoryWatcher, StopFlag};
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::debug;

/// A stream that yields each run of bytes appended to a file.
///
/// Unlike [`FollowingReader`](crate::FollowingReader) the watcher starts
/// immediately: `new` returns once the watch is live, so anything appended
/// afterwards is delivered.
pub struct FollowingStream {
    file_path: PathBuf,
    queue: HandoffQueue,
    closer: CloseHandle,
    finished: bool,
    _task_handle: JoinHandle<()>,
}

impl FollowingStream {
    /// Creates a new FollowingStream for the specified file.
    pub async fn new<P: AsRef<Path>>(path: P, config: FollowConfig) -> Result<Self> {
        let file_path = resolve_target(path)?;
        let (sender, queue) = HandoffQueue::new();
        let stop = StopFlag::default();

        let (watcher, ready) =
            DirectoryWatcher::new(file_path.clone(), config, sender.clone(), stop.clone());
        let task_handle = tokio::spawn(watcher.run());

        if ready.await.is_err() {
            debug!(
                "[stream] watcher for {} exited before becoming ready",
                file_path.display()
            );
        }

        Ok(FollowingStream {
            file_path,
            queue,
            closer: CloseHandle::new(sender, stop),
            finished: false,
            _task_handle: task_handle,
        })
    }

    /// The absolute path being followed.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// A handle that ends this stream from elsewhere.
    pub fn closer(&self) -> CloseHandle {
        self.closer.clone()
    }

    /// Stops the watcher; the stream ends after any chunks already queued.
    pub fn close(&self) {
        self.closer.close();
    }
}

impl Drop for FollowingStream {
    fn drop(&mut self) {
        // Graceful shutdown; the task notices within one poll interval
        self.closer.close();
    }
}

impl Stream for FollowingStream {
    type Item = Vec<u8>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            match self.queue.poll_pop(cx) {
                Poll::Ready(Some(Chunk::Data(bytes))) if bytes.is_empty() => continue,
                Poll::Ready(Some(Chunk::Data(bytes))) => return Poll::Ready(Some(bytes)),
                Poll::Ready(Some(Chunk::End)) | Poll::Ready(None) => {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
