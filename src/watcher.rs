//! Directory watching and growth detection for a single followed file.

use crate::config::{FollowConfig, OverflowPolicy};
use crate::error::Result;
use crate::queue::{Chunk, ChunkSender};
use crate::reader::{current_size, read_appended};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// A thin wrapper around the platform watcher, subscribed to a file's parent directory.
pub(crate) struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_path: PathBuf,
}

impl FileWatcher {
    /// Creates a new file watcher for the specified path.
    pub(crate) fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            receiver: rx,
            file_path,
        })
    }

    /// Starts watching the parent directory, so creation and rotation are seen too.
    pub(crate) fn start_watching(&mut self) -> Result<()> {
        let watch_path = self.file_path.parent().unwrap_or(&self.file_path);
        self.watcher.watch(watch_path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    /// Returns the next file system event, or `None` once the backend is gone.
    pub(crate) async fn next_event(&mut self) -> Option<notify::Result<Event>> {
        self.receiver.recv().await
    }

}

/// The kinds of notification the follower reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notification {
    Created,
    Modified,
    Deleted,
    /// The backend lost events and asks for a rescan.
    Overflow,
    Other,
}

impl Notification {
    pub(crate) fn classify(event: &Event) -> Self {
        if event.need_rescan() {
            return Notification::Overflow;
        }
        match event.kind {
            EventKind::Create(_) => Notification::Created,
            // Backends that cannot tell what changed report `Any`
            EventKind::Modify(_) | EventKind::Any => Notification::Modified,
            EventKind::Remove(_) => Notification::Deleted,
            _ => Notification::Other,
        }
    }
}

/// Check if a notify event is relevant to a specific file
pub(crate) fn is_event_relevant_to_file(event: &Event, target_file_name: &str) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy() == target_file_name)
            .unwrap_or(false)
    })
}

/// Shared stop request between a follower and its watcher.
#[derive(Debug, Clone, Default)]
pub(crate) struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Returns `true` only for the call that actually flipped the flag.
    pub(crate) fn request(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Background task that turns directory notifications into chunks of
/// newly appended bytes.
///
/// Dropping the watcher, whether after [`run`](Self::run) returns or without
/// it ever running, pushes [`Chunk::End`] so the consumer cannot wait forever.
pub(crate) struct DirectoryWatcher {
    file_path: PathBuf,
    file_name: String,
    baseline: u64,
    config: FollowConfig,
    queue: ChunkSender,
    stop: StopFlag,
    ready: Option<oneshot::Sender<()>>,
}

impl DirectoryWatcher {
    /// Returns the watcher together with the receiving end of its readiness
    /// signal. The signal fires once the subscription is live and the
    /// baseline is captured; it is dropped unsent if setup fails.
    pub(crate) fn new(
        file_path: PathBuf,
        config: FollowConfig,
        queue: ChunkSender,
        stop: StopFlag,
    ) -> (Self, oneshot::Receiver<()>) {
        let (ready_tx, ready_rx) = oneshot::channel();
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let watcher = Self {
            file_path,
            file_name,
            baseline: 0,
            config,
            queue,
            stop,
            ready: Some(ready_tx),
        };
        (watcher, ready_rx)
    }

    /// Runs the watch loop on a dedicated thread with its own runtime.
    pub(crate) fn spawn_thread(self) -> std::io::Result<thread::JoinHandle<()>> {
        let name = format!("{} watcher", self.file_name.replace('\0', ""));
        thread::Builder::new().name(name).spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(self.run()),
                Err(e) => error!(
                    "[watcher] failed to start runtime for {}: {e}",
                    self.file_path.display()
                ),
            }
        })
    }

    /// Watch until stopped or until the notification backend goes away.
    pub(crate) async fn run(mut self) {
        let mut watcher = match self.subscribe().await {
            Ok(watcher) => watcher,
            Err(e) => {
                error!("[watcher] failed to watch {}: {e}", self.file_path.display());
                return;
            }
        };

        debug!(
            "[watcher] following {} from offset {}",
            self.file_path.display(),
            self.baseline
        );
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(());
        }

        while !self.stop.is_requested() {
            match timeout(self.config.poll_wait(), watcher.next_event()).await {
                // Poll interval elapsed, re-check the stop flag
                Err(_) => continue,
                Ok(None) => {
                    debug!("[watcher] notification channel closed");
                    break;
                }
                Ok(Some(notification)) => self.process(notification).await,
            }
        }

        debug!("[watcher] stopped following {}", self.file_path.display());
    }

    /// Handles one notification. Failures are logged and the watch goes on.
    async fn process(&mut self, notification: notify::Result<Event>) {
        match notification {
            Err(e) => warn!("[watcher] file watch error: {e}"),
            Ok(event) => {
                if let Err(e) = self.handle_event(&event).await {
                    warn!(
                        "[watcher] failed to read growth of {}: {e}",
                        self.file_path.display()
                    );
                }
            }
        }
    }

    async fn subscribe(&mut self) -> Result<FileWatcher> {
        let mut watcher = FileWatcher::new(&self.file_path)?;
        watcher.start_watching()?;
        // Baseline is taken after the subscription so no growth slips between them
        self.baseline = current_size(&self.file_path).await?;
        Ok(watcher)
    }

    async fn handle_event(&mut self, event: &Event) -> Result<()> {
        match Notification::classify(event) {
            Notification::Overflow => match self.config.overflow {
                OverflowPolicy::Rescan => {
                    debug!("[watcher] overflow, rescanning {}", self.file_path.display());
                    self.forward_growth().await
                }
                OverflowPolicy::Ignore => {
                    debug!("[watcher] overflow ignored");
                    Ok(())
                }
            },
            _ if !is_event_relevant_to_file(event, &self.file_name) => Ok(()),
            Notification::Created | Notification::Modified => self.forward_growth().await,
            Notification::Deleted => {
                debug!("[watcher] {} removed", self.file_path.display());
                self.baseline = 0;
                Ok(())
            }
            Notification::Other => Ok(()),
        }
    }

    async fn forward_growth(&mut self) -> Result<()> {
        read_appended(
            &self.file_path,
            &mut self.baseline,
            self.config.chunk_size(),
            &self.queue,
        )
        .await?;
        Ok(())
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.queue.push(Chunk::End);
    }
}
