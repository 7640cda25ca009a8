//! Supervised background work.
//!
//! Every task spawned here is awaited by a watcher that logs its outcome,
//! including panics, so failures are never dropped silently and can never
//! reach the task that spawned them.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, warn};

#[derive(Debug, Default)]
struct Inner {
    in_flight: AtomicUsize,
    failures: AtomicUsize,
    idle: Notify,
}

/// Spawns and tracks fire-and-forget tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskSupervisor {
    inner: Arc<Inner>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on the runtime under `name`.
    ///
    /// Errors and panics are logged and counted.
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(task);

        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => debug!(task = name, "background task completed"),
                Ok(Err(e)) => {
                    inner.failures.fetch_add(1, Ordering::SeqCst);
                    error!(task = name, error = %e, "background task failed");
                }
                Err(join_error) if join_error.is_panic() => {
                    inner.failures.fetch_add(1, Ordering::SeqCst);
                    error!(task = name, "background task panicked");
                }
                Err(_) => warn!(task = name, "background task cancelled"),
            }
            if inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.idle.notify_waiters();
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Number of tasks that returned an error or panicked.
    pub fn failures(&self) -> usize {
        self.inner.failures.load(Ordering::SeqCst)
    }

    /// Resolves once no task is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Waits for in-flight tasks up to `limit`. Returns `false` on timeout.
    pub async fn drain(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait_idle()).await.is_ok()
    }
}
