/// Service module for the linkpulse link checking service
///
/// This module owns the public entry points of the subsystem: task creation
/// (which enqueues background probing and returns immediately), the bounded
/// completion wait, the batch read used for reporting, and the lifecycle of
/// the fixed worker pool behind it all.
use crate::config::Config;
use crate::message::{LinkStatus, ResultMap, Task};
use crate::prober::Prober;
use crate::runnable::Runnable;
use crate::store::Store;
use crate::worker::Worker;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

struct HandleHolder {
    name: String,
    handle: JoinHandle<()>,
}

/// Dispatcher and completion waiter over a fixed pool of workers.
///
/// # Fields
/// * `store` - Shared durable store, also read directly by the waiter
/// * `task_tx` - Sender side of the bounded task queue
/// * `shutdown_tx` - Watch channel flipped once to stop the workers
/// * `handles` - Worker join handles, awaited during shutdown
pub struct TaskService {
    store: Arc<Store>,
    task_tx: mpsc::Sender<Task>,
    shutdown_tx: watch::Sender<bool>,
    poll_interval: Duration,
    handles: Vec<HandleHolder>,
}

impl TaskService {
    /// Starts the worker pool and returns the service handle.
    pub fn new(store: Arc<Store>, config: &Config) -> Self {
        let (task_tx, task_rx) = mpsc::channel::<Task>(config.worker.queue_capacity);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (shutdown_tx, _) = watch::channel(false);

        let mut handles = Vec::with_capacity(config.worker.num_instance);
        for i in 0..config.worker.num_instance {
            let mut worker = Worker::new(
                i,
                store.clone(),
                Prober::new(&config.probe),
                task_rx.clone(),
                shutdown_tx.subscribe(),
            );
            let name = worker.name().to_string();
            let handle = tokio::spawn(async move { worker.run().await });
            handles.push(HandleHolder { name, handle });
        }
        tracing::info!("task service started with {} workers", config.worker.num_instance);

        Self {
            store,
            task_tx,
            shutdown_tx,
            poll_interval: config.waiter.poll_interval,
            handles,
        }
    }

    /// Creates a task for `links` and queues it for background probing.
    ///
    /// Returns the assigned id together with the initial all-`checking`
    /// status map. Blocks when the queue is full; that backpressure is the
    /// admission-control point of the service, not an error.
    pub async fn create(&self, links: Vec<String>) -> (u64, ResultMap) {
        let record = self.store.create_task(&links);
        let task = Task {
            id: record.id,
            links: record.links,
            done: false,
        };

        if let Err(e) = self.task_tx.send(task).await {
            // only possible once shutdown has begun; the task stays
            // persisted with its links marked checking
            tracing::warn!("failed to enqueue task {}: {}", record.id, e);
        }

        (record.id, record.result)
    }

    /// Polls the store until every link of the task has left `checking` or
    /// `max_wait` elapses, then returns whatever is available.
    ///
    /// On timeout the map may still contain `checking` entries; an unknown
    /// id yields an empty map. Never an error.
    pub async fn wait_and_get_results(&self, id: u64, max_wait: Duration) -> ResultMap {
        let deadline = Instant::now() + max_wait;

        loop {
            let mut snapshot = self.store.get_many(&[id]);
            match snapshot.remove(&id) {
                Some(result)
                    if !result.is_empty()
                        && result.values().all(|s| *s != LinkStatus::Checking) =>
                {
                    return result;
                }
                partial => {
                    if Instant::now() >= deadline {
                        return partial.unwrap_or_default();
                    }
                }
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Batch read for the report boundary. Unknown ids are absent from the
    /// returned mapping.
    pub fn get_for_report(&self, ids: &[u64]) -> HashMap<u64, ResultMap> {
        self.store.get_many(ids)
    }

    /// Stops the worker pool: signals shutdown once, closes the queue and
    /// joins every worker with a bounded timeout. Tasks still queued are
    /// abandoned; a task already claimed by a worker finishes its probes.
    pub async fn shutdown(self) {
        tracing::info!("shutting down task service");

        if let Err(e) = self.shutdown_tx.send(true) {
            tracing::debug!("no workers left to signal: {}", e);
        }
        drop(self.task_tx);

        for holder in self.handles {
            match timeout(WORKER_SHUTDOWN_TIMEOUT, holder.handle).await {
                Ok(_) => tracing::debug!("{} stopped", holder.name),
                Err(_) => tracing::warn!("{} did not stop in time", holder.name),
            }
        }

        tracing::info!("task service shutdown complete");
    }
}
