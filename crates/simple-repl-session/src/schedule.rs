//! Deferred tasks.
//!
//! The HUD re-positions itself shortly after opening so that output produced
//! by the text that was just sent has a chance to land first. That wait is a
//! scheduled task, never a sleep on the caller.

use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs tasks later.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has passed.
    fn defer(&self, delay: Duration, task: Task);
}

/// Scheduler backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Schedule on the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Schedule on the runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

/// Scheduler that queues tasks until told to run them.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<(Duration, Task)>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Run queued tasks, including any they schedule, in delay order.
    ///
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let mut batch = match self.queue.lock() {
                Ok(mut queue) => std::mem::take(&mut *queue),
                Err(_) => return ran,
            };
            if batch.is_empty() {
                return ran;
            }
            batch.sort_by_key(|(delay, _)| *delay);
            for (delay, task) in batch {
                debug!("Running deferred task (delay {:?})", delay);
                task();
                ran += 1;
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, delay: Duration, task: Task) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push((delay, task));
        }
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
