//! Batch control: cancellation, progress, background execution.
//!
//! Batch operations over many cards check a cooperative cancellation
//! token and report progress at a fixed cadence. Cancellation stops new
//! placements; anything already applied stays applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{Error, Result};

/// Default number of items between checkpoints.
pub const DEFAULT_CADENCE: usize = 200;

/// Shared cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Progress snapshot delivered to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Items processed so far.
    pub done: usize,
    /// Items in the batch.
    pub total: usize,
}

/// Boxed progress callback.
pub type ProgressFn = Box<dyn FnMut(Progress) + Send>;

/// Cancellation token plus progress callback for one batch.
pub struct BatchControl {
    token: CancellationToken,
    progress: Option<ProgressFn>,
    cadence: usize,
    cancelled: bool,
}

impl BatchControl {
    /// Control with a fresh token, no progress callback and the default cadence.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            progress: None,
            cadence: DEFAULT_CADENCE,
            cancelled: false,
        }
    }

    /// Uses an externally held token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Sets the progress callback.
    pub fn with_progress<F: FnMut(Progress) + Send + 'static>(mut self, callback: F) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Sets the checkpoint cadence (at least 1).
    pub fn with_cadence(mut self, cadence: usize) -> Self {
        self.cadence = cadence.max(1);
        self
    }

    /// The token this control observes.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Call after each processed item. Reports progress and checks the
    /// token every `cadence` items; returns `false` once cancelled.
    pub fn checkpoint(&mut self, done: usize, total: usize) -> bool {
        if self.cancelled {
            return false;
        }
        if done % self.cadence == 0 || done == total {
            if let Some(report) = self.progress.as_deref_mut() {
                report(Progress { done, total });
            }
            if self.token.is_cancelled() {
                self.cancelled = true;
                tracing::warn!(done, total, "batch cancelled");
                return false;
            }
        }
        true
    }

    /// Whether a checkpoint observed cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Default for BatchControl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BatchControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchControl")
            .field("cancelled", &self.token.is_cancelled())
            .field("cadence", &self.cadence)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

/// A batch running on its own thread.
#[derive(Debug)]
pub struct BackgroundJob<T> {
    handle: JoinHandle<T>,
    token: CancellationToken,
}

impl<T> BackgroundJob<T> {
    /// Requests cooperative cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The job's cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the thread has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the job.
    ///
    /// # Errors
    /// [`Error::Worker`] if the job panicked.
    pub fn join(self) -> Result<T> {
        self.handle
            .join()
            .map_err(|_| Error::Worker("batch thread panicked".into()))
    }
}

/// Runs `job` on a named background thread.
///
/// The job receives a [`BatchControl`] wired to the returned handle's
/// token; `progress` is installed as its callback.
pub fn spawn_batch<T, F>(
    name: &str,
    cadence: usize,
    progress: Option<ProgressFn>,
    job: F,
) -> Result<BackgroundJob<T>>
where
    T: Send + 'static,
    F: FnOnce(BatchControl) -> T + Send + 'static,
{
    let token = CancellationToken::new();
    let mut control = BatchControl::new()
        .with_token(token.clone())
        .with_cadence(cadence);
    control.progress = progress;

    let handle = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || job(control))
        .map_err(|e| Error::Worker(e.to_string()))?;
    tracing::debug!(name, "batch worker spawned");
    Ok(BackgroundJob { handle, token })
}
