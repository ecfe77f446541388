//! Push-category coordinator: registry plus callback server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::listener::{ListenerRegistry, SharedRegistry};
use crate::push::{PushCategory, PushError, PushServer};

use super::WorkerState;

/// Owns one push category end to end.
///
/// The first `add_listener` binds the category's callback server on the
/// configured address; `remove_listeners` clears the registry and stops the
/// server, releasing the port before returning.
pub struct PushCoordinator<C: PushCategory> {
    registry: SharedRegistry<C::Listener>,
    server: PushServer<C>,
    addr: SocketAddr,
    lifecycle: Mutex<()>,
}

impl<C: PushCategory> PushCoordinator<C> {
    /// Create a stopped coordinator serving callbacks on `addr`.
    pub fn new(addr: SocketAddr) -> Self {
        let registry: SharedRegistry<C::Listener> = Arc::new(ListenerRegistry::new());
        Self {
            server: PushServer::new(registry.clone()),
            registry,
            addr,
            lifecycle: Mutex::new(()),
        }
    }

    /// Register `listener`, starting the callback server if it is not
    /// running.
    ///
    /// A bind failure rolls the listener back out of the registry, so a later
    /// registration retries the bind.
    pub async fn add_listener(&self, listener: Arc<C::Listener>) -> Result<(), PushError> {
        let _guard = self.lifecycle.lock().await;
        self.registry.add(listener.clone());

        match self.server.start(self.addr).await {
            Ok(_) => {
                debug!(
                    category = C::CATEGORY,
                    listeners = self.registry.len(),
                    "push listener registered"
                );
                Ok(())
            }
            Err(error) => {
                self.registry.remove(&listener);
                Err(error)
            }
        }
    }

    /// Remove every listener and stop the callback server. A no-op when
    /// already stopped.
    pub async fn remove_listeners(&self) {
        let _guard = self.lifecycle.lock().await;
        self.registry.remove_all();
        self.server.stop().await;
        debug!(category = C::CATEGORY, "push category stopped");
    }

    /// Snapshot of the registered listeners.
    pub fn listeners(&self) -> Vec<Arc<C::Listener>> {
        self.registry.snapshot()
    }

    /// Current server state.
    pub fn state(&self) -> WorkerState {
        self.server.state()
    }

    /// Effective bound address while the server is listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{DeliveryStatusPushListener, ListenerError};
    use crate::model::DeliveryInfoNotification;
    use crate::push::DeliveryStatusPush;
    use std::net::{IpAddr, Ipv4Addr};

    struct NullListener;

    impl DeliveryStatusPushListener for NullListener {
        fn on_delivery_status_notification(
            &self,
            _notification: &DeliveryInfoNotification,
        ) -> Result<(), ListenerError> {
            Ok(())
        }
    }

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[tokio::test]
    async fn test_first_add_binds_server() {
        let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
        assert_eq!(coordinator.state(), WorkerState::Stopped);

        coordinator.add_listener(Arc::new(NullListener)).await.unwrap();
        assert_eq!(coordinator.state(), WorkerState::Running);
        assert!(coordinator.local_addr().await.is_some());

        coordinator.remove_listeners().await;
        assert_eq!(coordinator.state(), WorkerState::Stopped);
        assert_eq!(coordinator.local_addr().await, None);
    }

    #[tokio::test]
    async fn test_many_listeners_share_one_server() {
        let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));

        coordinator.add_listener(Arc::new(NullListener)).await.unwrap();
        let addr = coordinator.local_addr().await;

        coordinator.add_listener(Arc::new(NullListener)).await.unwrap();
        coordinator.add_listener(Arc::new(NullListener)).await.unwrap();

        assert_eq!(coordinator.listeners().len(), 3);
        assert_eq!(coordinator.local_addr().await, addr);

        coordinator.remove_listeners().await;
    }

    #[tokio::test]
    async fn test_bind_failure_rolls_registration_back() {
        let blocker = tokio::net::TcpListener::bind(loopback(0)).await.unwrap();
        let taken = blocker.local_addr().unwrap();

        let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(taken);
        let result = coordinator.add_listener(Arc::new(NullListener)).await;

        assert!(matches!(result, Err(PushError::Bind { .. })));
        assert!(coordinator.listeners().is_empty());
        assert_eq!(coordinator.state(), WorkerState::Stopped);

        // Once the port frees up, registration succeeds.
        drop(blocker);
        coordinator.add_listener(Arc::new(NullListener)).await.unwrap();
        assert_eq!(coordinator.listeners().len(), 1);
        coordinator.remove_listeners().await;
    }

    #[tokio::test]
    async fn test_remove_when_stopped_is_noop() {
        let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
        coordinator.remove_listeners().await;
        coordinator.remove_listeners().await;
        assert_eq!(coordinator.state(), WorkerState::Stopped);
    }
}
