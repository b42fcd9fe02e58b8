//! Concurrent fan-out executor.
//!
//! Runs independent listing calls in the background on a bounded pool and
//! hands back a [`TaskHandle`] the caller joins later. Each task owns its
//! whole request/decode/classify pipeline, so a task's outcome is exactly
//! what the same call would have produced inline.
//!
//! The executor is created once by the process-wide adapter and lives as
//! long as it does. Tasks are not cancellable: dropping a handle detaches
//! the task, which still runs to completion.

use crate::error::{AdapterError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Default number of concurrently running tasks
pub const DEFAULT_WORKERS: usize = 4;

/// Bounded pool for background listing tasks
#[derive(Debug, Clone)]
pub struct FanOutExecutor {
    /// One permit per running task
    permits: Arc<Semaphore>,

    /// Pool size
    workers: usize,

    /// Tasks currently holding a permit
    in_flight: Arc<AtomicUsize>,
}

impl FanOutExecutor {
    /// Creates an executor running at most `workers` tasks at once
    /// (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        tracing::info!(workers, "Created fan-out executor");

        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of tasks running right now
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Submit a task. It starts as soon as a permit is free; the caller
    /// continues immediately.
    pub fn submit<T, F>(&self, label: &str, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let in_flight = Arc::clone(&self.in_flight);
        let task_label = label.to_string();

        let inner = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| AdapterError::fatal(&task_label, "", "worker pool is closed"))?;

            let _running = InFlight::enter(in_flight);
            tracing::debug!(task = %task_label, "fan-out task started");
            task.await
        });

        TaskHandle {
            label: label.to_string(),
            inner,
        }
    }
}

/// Counts one running task; the count drops again when the task ends,
/// including by panic
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for FanOutExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

/// Pending result of a submitted task
#[derive(Debug)]
pub struct TaskHandle<T> {
    label: String,
    inner: JoinHandle<Result<T>>,
}

impl<T> TaskHandle<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait for the task. Its own error comes back unchanged; a task that
    /// panicked surfaces as Fatal.
    pub async fn join(self) -> Result<T> {
        match self.inner.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(task = %self.label, "fan-out task failed: {}", e);
                Err(AdapterError::fatal(&self.label, "", format!("background task failed: {}", e)))
            },
        }
    }
}

/// Join every handle, keeping each outcome separate
pub async fn join_all<T>(handles: Vec<TaskHandle<T>>) -> Vec<Result<T>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.join().await);
    }
    results
}
