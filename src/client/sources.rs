//! Poll sources for the operator's REST endpoints.
//!
//! Each source owns URL construction and payload decoding for one pull
//! category. Both endpoints dequeue server-side on read, so they ignore the
//! watermark cursor; the retriever enforces it client-side.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::codec;
use crate::listener::{DeliveryReportListener, InboundMessageListener, ListenerError};
use crate::model::{DeliveryReport, InboundSmsMessage, InboundSmsMessageList};
use crate::retriever::{FetchError, PollSource};
use crate::transport::HttpTransport;

pub(crate) const DELIVERY_REPORTS_PATH: &str = "smsmessaging/outbound/requests/deliveryReports";
pub(crate) const INBOUND_MESSAGES_PATH: &str = "smsmessaging/inbound/messages";
pub(crate) const ROAMING_QUERY_PATH: &str = "terminalstatus/queries/roamingStatus";

/// Build `base/path` with the given query parameters.
pub(crate) fn endpoint_url(
    base: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

/// Poll feed for delivery reports.
pub struct DeliveryReportSource {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

/// Fetch refinement for delivery reports.
#[derive(Debug, Default)]
pub struct DeliveryReportFilter {
    /// Restrict reports to one send request.
    pub request_id: Option<String>,
}

impl DeliveryReportSource {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: String) -> Self {
        Self { transport, base_url }
    }
}

#[async_trait]
impl PollSource for DeliveryReportSource {
    type Item = DeliveryReport;
    type Listener = dyn DeliveryReportListener;
    type Filter = DeliveryReportFilter;

    const CATEGORY: &'static str = "delivery-reports";

    async fn fetch(
        &self,
        filter: &Self::Filter,
        _newer_than: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Self::Item>, FetchError> {
        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(request_id) = &filter.request_id {
            params.push(("requestId", request_id.clone()));
        }

        let url = endpoint_url(&self.base_url, DELIVERY_REPORTS_PATH, &params)?;
        let response = self.transport.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(FetchError::Status { status: response.status });
        }

        Ok(codec::decode_root(&response.body, "deliveryReports")?)
    }

    // A request-scoped fetch must not move the category watermark: reports
    // pending for other requests would be skipped by later cycles.
    fn is_selective(filter: &Self::Filter) -> bool {
        filter.request_id.is_some()
    }

    fn item_id(item: &Self::Item) -> &str {
        &item.message_id
    }

    fn deliver_to(listener: &Self::Listener, item: &Self::Item) -> Result<(), ListenerError> {
        listener.on_delivery_report(item)
    }
}

/// Poll feed for inbound messages.
pub struct InboundMessageSource {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl InboundMessageSource {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: String) -> Self {
        Self { transport, base_url }
    }
}

#[async_trait]
impl PollSource for InboundMessageSource {
    type Item = InboundSmsMessage;
    type Listener = dyn InboundMessageListener;
    type Filter = ();

    const CATEGORY: &'static str = "inbound-messages";

    async fn fetch(
        &self,
        _filter: &(),
        _newer_than: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Self::Item>, FetchError> {
        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("maxBatchSize", limit.to_string()));
        }

        let url = endpoint_url(&self.base_url, INBOUND_MESSAGES_PATH, &params)?;
        let response = self.transport.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(FetchError::Status { status: response.status });
        }

        let list: InboundSmsMessageList = codec::decode_root(&response.body, "inboundSMSMessageList")?;
        Ok(list.inbound_sms_message)
    }

    fn item_id(item: &Self::Item) -> &str {
        &item.message_id
    }

    fn deliver_to(listener: &Self::Listener, item: &Self::Item) -> Result<(), ListenerError> {
        listener.on_inbound_message(item)
    }
}
