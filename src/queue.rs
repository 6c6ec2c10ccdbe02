//! Handoff queue between the watcher and the reader.

use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One entry in the handoff queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
    /// Bytes appended to the followed file, in file order.
    Data(Vec<u8>),
    /// The stream is closed for good.
    End,
}

/// Producer side of the queue. Cheap to clone; every clone feeds the same queue.
#[derive(Debug, Clone)]
pub(crate) struct ChunkSender {
    tx: mpsc::UnboundedSender<Chunk>,
}

impl ChunkSender {
    /// Never blocks. A chunk pushed after the consumer is gone is dropped.
    pub(crate) fn push(&self, chunk: Chunk) {
        let _ = self.tx.send(chunk);
    }
}

/// Unbounded FIFO of chunks with a blocking consumer side.
#[derive(Debug)]
pub(crate) struct HandoffQueue {
    receiver: mpsc::UnboundedReceiver<Chunk>,
}

impl HandoffQueue {
    pub(crate) fn new() -> (ChunkSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChunkSender { tx }, Self { receiver: rx })
    }

    /// Blocks the calling thread until a chunk is available.
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    /// Must not be called from within an async runtime.
    pub(crate) fn pop(&mut self) -> Option<Chunk> {
        self.receiver.blocking_recv()
    }

    #[cfg(test)]
    pub(crate) fn try_pop(&mut self) -> Option<Chunk> {
        self.receiver.try_recv().ok()
    }

    pub(crate) fn poll_pop(&mut self, cx: &mut Context<'_>) -> Poll<Option<Chunk>> {
        self.receiver.poll_recv(cx)
    }
}
