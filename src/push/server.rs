//! Callback HTTP server for one push category.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::lifecycle::WorkerState;
use crate::listener::{deliver, SharedRegistry};

use super::{PushCategory, PushError};

/// Embedded HTTP server accepting operator callbacks for one category.
///
/// At most one bound listener exists per server. `start` and `stop` are
/// idempotent and serialize against each other; callbacks accepted before
/// `stop` returns have run to completion.
pub struct PushServer<C: PushCategory> {
    registry: SharedRegistry<C::Listener>,
    inner: Mutex<Option<Bound>>,
    state: watch::Sender<WorkerState>,
}

struct Bound {
    requested: SocketAddr,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<C: PushCategory> PushServer<C> {
    /// Create a stopped server dispatching to `registry`.
    pub fn new(registry: SharedRegistry<C::Listener>) -> Self {
        let (state, _) = watch::channel(WorkerState::Stopped);
        Self {
            registry,
            inner: Mutex::new(None),
            state,
        }
    }

    /// Bind `addr` and start serving callbacks.
    ///
    /// A no-op when already listening on the same requested address; a
    /// different address is refused. Returns the effective local address,
    /// which differs from `addr` when port 0 was requested. Bind failures
    /// surface here and leave the server stopped.
    pub async fn start(&self, addr: SocketAddr) -> Result<SocketAddr, PushError> {
        let mut inner = self.inner.lock().await;

        if let Some(bound) = inner.as_ref() {
            if bound.requested == addr {
                return Ok(bound.local_addr);
            }
            return Err(PushError::AddrMismatch {
                bound: bound.local_addr,
                requested: addr,
            });
        }

        self.state.send_replace(WorkerState::Starting);
        let bound = match Self::bind_and_serve(addr, self.registry.clone()).await {
            Ok(bound) => bound,
            Err(error) => {
                self.state.send_replace(WorkerState::Stopped);
                return Err(error);
            }
        };

        let local_addr = bound.local_addr;
        *inner = Some(bound);
        self.state.send_replace(WorkerState::Running);
        info!(category = C::CATEGORY, address = %local_addr, "push callback server listening");
        Ok(local_addr)
    }

    async fn bind_and_serve(
        requested: SocketAddr,
        registry: SharedRegistry<C::Listener>,
    ) -> Result<Bound, PushError> {
        let listener = TcpListener::bind(requested).await.map_err(|source| PushError::Bind {
            addr: requested,
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| PushError::Bind {
            addr: requested,
            source,
        })?;

        let router = Router::new()
            .route("/", post(callback::<C>))
            .route("/{*path}", post(callback::<C>))
            .with_state(registry);

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let serving = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });
            if let Err(error) = serving.await {
                error!(category = C::CATEGORY, error = %error, "push callback server failed");
            }
        });

        Ok(Bound {
            requested,
            local_addr,
            shutdown,
            task,
        })
    }

    /// Stop serving and release the port. A no-op when already stopped.
    ///
    /// The port is free again by the time this returns.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let Some(bound) = inner.take() else {
            return;
        };

        self.state.send_replace(WorkerState::Stopping);
        let _ = bound.shutdown.send(true);
        if let Err(error) = bound.task.await {
            warn!(category = C::CATEGORY, error = %error, "push callback server task failed");
        }
        self.state.send_replace(WorkerState::Stopped);
        info!(category = C::CATEGORY, "push callback server stopped");
    }

    /// Effective bound address while listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().await.as_ref().map(|bound| bound.local_addr)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle transitions.
    pub fn state_watch(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }
}

/// POST handler shared by the root and any notify path the operator was
/// provisioned with. Undecodable bodies are rejected with 400 and dispatch
/// nothing.
async fn callback<C: PushCategory>(
    State(registry): State<SharedRegistry<C::Listener>>,
    body: Bytes,
) -> StatusCode {
    let notification = match C::decode(&body) {
        Ok(notification) => notification,
        Err(error) => {
            warn!(
                category = C::CATEGORY,
                bytes = body.len(),
                error = %error,
                "rejecting undecodable callback body"
            );
            return StatusCode::BAD_REQUEST;
        }
    };

    let snapshot = registry.snapshot();
    debug!(
        category = C::CATEGORY,
        listeners = snapshot.len(),
        "dispatching push notification"
    );
    for listener in &snapshot {
        deliver(C::CATEGORY, listener, |l| C::deliver_to(l, &notification));
    }

    StatusCode::OK
}
