use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, instrument};

#[derive(thiserror::Error, Debug)]
pub enum ExecutorError {
    #[error("Worker pool closed: {0}")]
    Closed(String),
}

/// Bounded pool for destination writes.
///
/// Each spawned task holds one semaphore permit for its whole lifetime, so at
/// most `workers` writes are in flight. With a single worker, tasks run
/// strictly one after another.
///
/// Callers reserve a [`WorkerSlot`] first and spawn onto it, which lets them
/// re-check cancellation once a worker is actually free.
pub struct WriteExecutor {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl WriteExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let workers = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Waits until a worker is free.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<WorkerSlot, ExecutorError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| ExecutorError::Closed(e.to_string()))?;
        Ok(WorkerSlot { permit })
    }
}

/// A reserved worker. Dropping it without spawning frees the slot.
pub struct WorkerSlot {
    permit: OwnedSemaphorePermit,
}

impl WorkerSlot {
    /// Runs `task` on `tasks`, holding the slot until it finishes.
    pub fn spawn<F>(self, tasks: &mut JoinSet<()>, label: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(label, "Dispatching write");
        let permit = self.permit;
        tasks.spawn(async move {
            let _permit = permit;
            task.await;
        });
    }
}
