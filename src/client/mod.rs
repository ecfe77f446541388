//! Client facades over the notification machinery.
//!
//! [`SmsClient`] owns the SMS categories: pull retrievers for delivery reports
//! and inbound messages, push servers for delivery status and inbound message
//! callbacks. [`HlrClient`] owns the roaming category plus the on-demand
//! roaming queries. Each category's worker or server starts lazily on the first
//! listener registration and stops when that category's listeners are removed.

mod sources;

pub use sources::{DeliveryReportFilter, DeliveryReportSource, InboundMessageSource};

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::debug;

use crate::codec;
use crate::config::Config;
use crate::lifecycle::{PullCoordinator, PushCoordinator, WorkerState};
use crate::listener::{
    DeliveryReportListener, DeliveryStatusPushListener, HlrPushListener, InboundMessageListener,
    InboundMessagePushListener,
};
use crate::model::{DeliveryReport, InboundSmsMessage, Roaming};
use crate::push::{DeliveryStatusPush, HlrPush, InboundMessagePush};
use crate::retriever::FetchError;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Errors surfaced by the client facades.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Push(#[from] crate::push::PushError),

    #[error(transparent)]
    Transport(#[from] crate::transport::TransportError),
}

/// SMS messaging client: delivery report and inbound message notifications.
pub struct SmsClient {
    delivery_report_pull: PullCoordinator<DeliveryReportSource>,
    inbound_pull: PullCoordinator<InboundMessageSource>,
    delivery_status_push: PushCoordinator<DeliveryStatusPush>,
    inbound_push: PushCoordinator<InboundMessagePush>,
    delivery_report_batch: u32,
    inbound_batch: u32,
}

impl SmsClient {
    /// Build a client over the production HTTP transport.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Build a client over a caller-supplied transport.
    pub fn with_transport(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        let delivery_report_pull = PullCoordinator::new(
            DeliveryReportSource::new(transport.clone(), config.base_url.clone()),
            config.delivery_report_pull.interval,
            Some(config.delivery_report_pull.batch_size),
        );
        let inbound_pull = PullCoordinator::new(
            InboundMessageSource::new(transport, config.base_url.clone()),
            config.inbound_pull.interval,
            Some(config.inbound_pull.batch_size),
        );
        let delivery_status_push = PushCoordinator::new(config.push.delivery_status_addr());
        let inbound_push = PushCoordinator::new(config.push.inbound_messages_addr());

        Self {
            delivery_report_pull,
            inbound_pull,
            delivery_status_push,
            inbound_push,
            delivery_report_batch: config.delivery_report_pull.batch_size,
            inbound_batch: config.inbound_pull.batch_size,
        }
    }

    // Pull: delivery reports.

    /// Register a pull listener for delivery reports, starting the polling
    /// worker if needed.
    pub async fn add_pull_delivery_report_listener(
        &self,
        listener: Arc<dyn DeliveryReportListener>,
    ) {
        self.delivery_report_pull.add_listener(listener).await;
    }

    /// Remove all delivery report pull listeners and stop their worker.
    pub async fn remove_pull_delivery_report_listeners(&self) {
        self.delivery_report_pull.remove_listeners().await;
    }

    /// Snapshot of the delivery report pull listeners.
    pub fn delivery_report_pull_listeners(&self) -> Vec<Arc<dyn DeliveryReportListener>> {
        self.delivery_report_pull.listeners()
    }

    /// Worker state of the delivery report pull category.
    pub fn delivery_report_pull_state(&self) -> WorkerState {
        self.delivery_report_pull.state()
    }

    // Pull: inbound messages.

    /// Register a pull listener for inbound messages, starting the polling
    /// worker if needed.
    pub async fn add_pull_inbound_message_listener(
        &self,
        listener: Arc<dyn InboundMessageListener>,
    ) {
        self.inbound_pull.add_listener(listener).await;
    }

    /// Remove all inbound message pull listeners and stop their worker.
    pub async fn remove_pull_inbound_message_listeners(&self) {
        self.inbound_pull.remove_listeners().await;
    }

    /// Snapshot of the inbound message pull listeners.
    pub fn inbound_message_pull_listeners(&self) -> Vec<Arc<dyn InboundMessageListener>> {
        self.inbound_pull.listeners()
    }

    /// Worker state of the inbound message pull category.
    pub fn inbound_message_pull_state(&self) -> WorkerState {
        self.inbound_pull.state()
    }

    // Push: delivery status.

    /// Register a push listener for delivery status callbacks, binding the
    /// configured callback port if needed.
    pub async fn add_push_delivery_status_listener(
        &self,
        listener: Arc<dyn DeliveryStatusPushListener>,
    ) -> Result<(), ClientError> {
        self.delivery_status_push.add_listener(listener).await?;
        Ok(())
    }

    /// Remove all delivery status push listeners and stop their callback
    /// server.
    pub async fn remove_push_delivery_status_listeners(&self) {
        self.delivery_status_push.remove_listeners().await;
    }

    /// Snapshot of the delivery status push listeners.
    pub fn delivery_status_push_listeners(&self) -> Vec<Arc<dyn DeliveryStatusPushListener>> {
        self.delivery_status_push.listeners()
    }

    /// Effective delivery status callback address while listening.
    pub async fn delivery_status_push_addr(&self) -> Option<SocketAddr> {
        self.delivery_status_push.local_addr().await
    }

    // Push: inbound messages.

    /// Register a push listener for inbound message callbacks, binding the
    /// configured callback port if needed.
    pub async fn add_push_inbound_message_listener(
        &self,
        listener: Arc<dyn InboundMessagePushListener>,
    ) -> Result<(), ClientError> {
        self.inbound_push.add_listener(listener).await?;
        Ok(())
    }

    /// Remove all inbound message push listeners and stop their callback
    /// server.
    pub async fn remove_push_inbound_message_listeners(&self) {
        self.inbound_push.remove_listeners().await;
    }

    /// Snapshot of the inbound message push listeners.
    pub fn inbound_message_push_listeners(&self) -> Vec<Arc<dyn InboundMessagePushListener>> {
        self.inbound_push.listeners()
    }

    /// Effective inbound message callback address while listening.
    pub async fn inbound_message_push_addr(&self) -> Option<SocketAddr> {
        self.inbound_push.local_addr().await
    }

    // On-demand fetches. The unfiltered ones run the same serialized cycle as
    // the polling worker, so registered listeners see each new item exactly
    // once; the request-scoped one is plain request/response.

    /// Fetch pending inbound messages now. Returns everything the remote
    /// sent, dispatching newly observed messages to the pull listeners.
    pub async fn get_inbound_messages(
        &self,
        max_batch_size: Option<u32>,
    ) -> Result<Vec<InboundSmsMessage>, ClientError> {
        let limit = max_batch_size.unwrap_or(self.inbound_batch);
        Ok(self.inbound_pull.fetch_now(&(), Some(limit)).await?)
    }

    /// Fetch delivery reports now. Returns everything the remote sent,
    /// dispatching newly observed reports to the pull listeners.
    pub async fn get_delivery_reports(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<DeliveryReport>, ClientError> {
        let limit = limit.unwrap_or(self.delivery_report_batch);
        Ok(self
            .delivery_report_pull
            .fetch_now(&DeliveryReportFilter::default(), Some(limit))
            .await?)
    }

    /// Fetch delivery reports for one send request.
    ///
    /// Plain request/response: the restricted batch goes to the caller only,
    /// leaving the category watermark and the pull listeners untouched, so
    /// reports pending for other requests still reach the listeners on the
    /// next poll.
    pub async fn get_delivery_reports_by_request_id(
        &self,
        request_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<DeliveryReport>, ClientError> {
        let limit = limit.unwrap_or(self.delivery_report_batch);
        let filter = DeliveryReportFilter {
            request_id: Some(request_id.to_owned()),
        };
        Ok(self.delivery_report_pull.fetch_now(&filter, Some(limit)).await?)
    }
}

/// HLR client: roaming status notifications and queries.
pub struct HlrClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    roaming_push: PushCoordinator<HlrPush>,
}

impl HlrClient {
    /// Build a client over the production HTTP transport.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Build a client over a caller-supplied transport.
    pub fn with_transport(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            roaming_push: PushCoordinator::new(config.push.hlr_addr()),
            base_url: config.base_url,
            transport,
        }
    }

    /// Query the current roaming status of `address`.
    pub async fn query_roaming_status(&self, address: &str) -> Result<Roaming, ClientError> {
        debug!(address, "querying roaming status");

        let url = sources::endpoint_url(
            &self.base_url,
            sources::ROAMING_QUERY_PATH,
            &[
                ("address", address.to_owned()),
                ("includeExtendedData", "true".to_owned()),
            ],
        )
        .map_err(FetchError::from)?;

        let response = self
            .transport
            .get(url.as_str())
            .await
            .map_err(FetchError::from)?;
        if !response.is_success() {
            return Err(FetchError::Status { status: response.status }.into());
        }

        Ok(codec::decode_root(&response.body, "roaming").map_err(FetchError::from)?)
    }

    /// Ask the operator to deliver the roaming status of `address` to
    /// `notify_url` instead of the response body.
    ///
    /// The result arrives as a roaming callback, so `notify_url` usually
    /// points at a server started by [`Self::add_push_roaming_listener`].
    /// `client_correlator` lets the operator recognize a retried query;
    /// `callback_data` is echoed back in the notification.
    pub async fn query_roaming_status_async(
        &self,
        address: &str,
        notify_url: &str,
        client_correlator: Option<&str>,
        callback_data: Option<&str>,
    ) -> Result<(), ClientError> {
        debug!(address, notify_url, "querying roaming status to notify url");

        let mut params = vec![
            ("address", address.to_owned()),
            ("includeExtendedData", "true".to_owned()),
            ("notifyURL", notify_url.to_owned()),
        ];
        if let Some(correlator) = client_correlator.filter(|c| !c.is_empty()) {
            params.push(("clientCorrelator", correlator.to_owned()));
        }
        if let Some(data) = callback_data.filter(|d| !d.is_empty()) {
            params.push(("callbackData", data.to_owned()));
        }

        let url = sources::endpoint_url(&self.base_url, sources::ROAMING_QUERY_PATH, &params)
            .map_err(FetchError::from)?;

        let response = self
            .transport
            .get(url.as_str())
            .await
            .map_err(FetchError::from)?;
        if !response.is_success() {
            return Err(FetchError::Status { status: response.status }.into());
        }

        Ok(())
    }

    /// Register a push listener for roaming callbacks, binding the configured
    /// callback port if needed.
    pub async fn add_push_roaming_listener(
        &self,
        listener: Arc<dyn HlrPushListener>,
    ) -> Result<(), ClientError> {
        self.roaming_push.add_listener(listener).await?;
        Ok(())
    }

    /// Remove all roaming push listeners and stop their callback server.
    pub async fn remove_push_roaming_listeners(&self) {
        self.roaming_push.remove_listeners().await;
    }

    /// Snapshot of the roaming push listeners.
    pub fn roaming_push_listeners(&self) -> Vec<Arc<dyn HlrPushListener>> {
        self.roaming_push.listeners()
    }

    /// Effective roaming callback address while listening.
    pub async fn roaming_push_addr(&self) -> Option<SocketAddr> {
        self.roaming_push.local_addr().await
    }
}
