/// Worker module for the linkpulse link checking service
///
/// This module implements the long-lived worker loop: pull one task off the
/// shared bounded queue, probe every link of that task sequentially and
/// write each result to the durable store as soon as it is known. Exactly
/// one worker owns a task at a time, so per-task result writes are never
/// concurrent.
use crate::message::Task;
use crate::prober::Prober;
use crate::runnable::Runnable;
use crate::store::Store;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

const WORKER_NAME_PREFIX: &str = "Worker";

/// Worker that drains the task queue in the background.
///
/// # Fields
/// * `task_rx` - Shared receiver for the bounded task queue
/// * `shutdown_rx` - Watch handle flipped once when the service shuts down
/// * `store` - Durable store every probe result is written to
/// * `prober` - Reachability prober applied to each link
pub struct Worker {
    name: String,
    store: Arc<Store>,
    prober: Prober,
    task_rx: Arc<Mutex<mpsc::Receiver<Task>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Worker {
    pub fn new(
        id: usize,
        store: Arc<Store>,
        prober: Prober,
        task_rx: Arc<Mutex<mpsc::Receiver<Task>>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            name: format!("{}-{}", WORKER_NAME_PREFIX, id),
            store,
            prober,
            task_rx,
            shutdown_rx,
        }
    }

    /// Waits for the next task while watching for shutdown. Returns `None`
    /// on shutdown or when the queue sender is gone.
    async fn receive(&mut self) -> Option<Task> {
        let mut rx = self.task_rx.lock().await;
        tokio::select! {
            task = rx.recv() => task,
            _ = self.shutdown_rx.changed() => None,
        }
    }

    /// Probes every link of the task sequentially and records each result.
    ///
    /// Shutdown is not checked mid-task: a claimed task runs to completion
    /// so no link is left as `checking` by a half-processed task.
    async fn process_task(&self, mut task: Task) {
        tracing::debug!(
            "{} checking task {} ({} links)",
            self.name,
            task.id,
            task.links.len()
        );

        for link in &task.links {
            let status = self.prober.probe(link).await;
            self.store.save_result(task.id, link, status);
        }

        // advisory only; readers derive completion from the result map
        task.done = true;
        tracing::debug!("{} finished task {}", self.name, task.id);
    }
}

#[async_trait]
impl Runnable for Worker {
    async fn run(&mut self) {
        tracing::debug!("{} started", self.name);

        while let Some(task) = self.receive().await {
            self.process_task(task).await;
        }

        tracing::debug!("{} stopped", self.name);
    }

    fn name(&self) -> &str {
        &self.name
    }
}
