//! Tuning knobs for following a file.

use std::time::Duration;

/// Default bound on how long the watcher waits for a notification before
/// re-checking its stop flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest wait the watcher accepts; anything below would spin.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default maximum number of bytes carried by a single chunk.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// What the watcher does when the notification backend reports that events
/// were dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Compare the current file size against the baseline, as for a modify event.
    #[default]
    Rescan,
    /// Drop the notification. Growth that happened during the overflow is
    /// only picked up by the next event naming the file.
    Ignore,
}

/// Configuration for a followed file.
#[derive(Debug, Clone)]
pub struct FollowConfig {
    /// Upper bound on the watcher's wait for a notification. Shutdown
    /// latency is at most this long.
    pub poll_interval: Duration,
    /// Maximum number of bytes per chunk handed to the reader.
    pub read_buffer_size: usize,
    /// Handling of overflow/rescan notifications.
    pub overflow: OverflowPolicy,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl FollowConfig {
    /// Sets the poll interval; values below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Sets the chunk size; zero is raised to one byte.
    pub fn with_read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size.max(1);
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Poll interval actually used, in case the field was set below the minimum directly.
    pub(crate) fn poll_wait(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }

    /// Chunk size actually used, in case the field was set to zero directly.
    pub(crate) fn chunk_size(&self) -> usize {
        self.read_buffer_size.max(1)
    }
}
