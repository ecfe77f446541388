//! Pull-category coordinator: registry plus polling worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::listener::{ListenerRegistry, SharedRegistry};
use crate::retriever::{FetchError, PollSource, PollingRetriever};

use super::WorkerState;

/// Owns one pull category end to end.
///
/// The first `add_listener` starts the polling worker; `remove_listeners`
/// clears the registry and stops the worker, awaiting its exit. On-demand
/// fetches run through the retriever's serialized cycle whether or not the
/// worker is running.
pub struct PullCoordinator<S: PollSource> {
    registry: SharedRegistry<S::Listener>,
    retriever: Arc<PollingRetriever<S>>,
    interval: Duration,
    batch_limit: Option<u32>,
    worker: Mutex<Option<Worker>>,
    state: watch::Sender<WorkerState>,
}

struct Worker {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<S: PollSource> PullCoordinator<S> {
    /// Create a stopped coordinator polling `source` every `interval`.
    pub fn new(source: S, interval: Duration, batch_limit: Option<u32>) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let retriever = Arc::new(PollingRetriever::new(source, registry.clone()));
        let (state, _) = watch::channel(WorkerState::Stopped);
        Self {
            registry,
            retriever,
            interval,
            batch_limit,
            worker: Mutex::new(None),
            state,
        }
    }

    /// Register `listener`, starting the polling worker if it is not running.
    pub async fn add_listener(&self, listener: Arc<S::Listener>) {
        let mut worker = self.worker.lock().await;
        self.registry.add(listener);
        debug!(
            category = S::CATEGORY,
            listeners = self.registry.len(),
            "pull listener registered"
        );

        if worker.is_none() {
            self.state.send_replace(WorkerState::Starting);
            let (stop, stop_rx) = watch::channel(false);
            let task = tokio::spawn(self.retriever.clone().run(
                self.interval,
                self.batch_limit,
                stop_rx,
            ));
            *worker = Some(Worker { stop, task });
            self.state.send_replace(WorkerState::Running);
        }
    }

    /// Remove every listener and stop the worker, awaiting its exit. A no-op
    /// when already stopped.
    pub async fn remove_listeners(&self) {
        let mut worker = self.worker.lock().await;
        self.registry.remove_all();

        let Some(Worker { stop, task }) = worker.take() else {
            return;
        };

        self.state.send_replace(WorkerState::Stopping);
        let _ = stop.send(true);
        if let Err(error) = task.await {
            warn!(category = S::CATEGORY, error = %error, "polling worker task failed");
        }
        self.state.send_replace(WorkerState::Stopped);
        debug!(category = S::CATEGORY, "pull category stopped");
    }

    /// Snapshot of the registered listeners.
    pub fn listeners(&self) -> Vec<Arc<S::Listener>> {
        self.registry.snapshot()
    }

    /// Current worker state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Run one on-demand cycle, returning everything the remote sent.
    ///
    /// New items are dispatched to the registered listeners exactly as a
    /// background cycle would dispatch them. A selective filter turns the
    /// cycle into plain request/response: no dispatch, watermark untouched.
    pub async fn fetch_now(
        &self,
        filter: &S::Filter,
        limit: Option<u32>,
    ) -> Result<Vec<S::Item>, FetchError> {
        self.retriever.run_cycle(filter, limit).await
    }
}
