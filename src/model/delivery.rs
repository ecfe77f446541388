//! Delivery report and delivery status models.

use serde::{Deserialize, Serialize};

/// Delivery status values defined by the OneAPI specification.
///
/// Statuses the crate does not know about decode as [`DeliveryStatus::Unknown`]
/// rather than failing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    DeliveredToTerminal,
    DeliveredToNetwork,
    DeliveryUncertain,
    DeliveryImpossible,
    MessageWaiting,
    #[serde(other)]
    Unknown,
}

impl DeliveryStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::DeliveredToTerminal => "DeliveredToTerminal",
            DeliveryStatus::DeliveredToNetwork => "DeliveredToNetwork",
            DeliveryStatus::DeliveryUncertain => "DeliveryUncertain",
            DeliveryStatus::DeliveryImpossible => "DeliveryImpossible",
            DeliveryStatus::MessageWaiting => "MessageWaiting",
            DeliveryStatus::Unknown => "Unknown",
        }
    }
}

/// One delivery report returned by the polling endpoint.
///
/// Wire root: `deliveryReports`, carrying an array of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// Identifier of the reported message. Also the watermark cursor value.
    pub message_id: String,

    /// Send request the report belongs to, when the operator provides it.
    #[serde(default)]
    pub request_id: Option<String>,

    /// Destination address the report refers to.
    #[serde(default)]
    pub address: Option<String>,

    pub delivery_status: DeliveryStatus,

    /// Opaque correlation data echoed from the send request.
    #[serde(default)]
    pub callback_data: Option<String>,
}

/// Delivery details carried inside a push notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub address: String,

    pub delivery_status: DeliveryStatus,

    #[serde(default)]
    pub message_id: Option<String>,
}

/// Envelope the operator posts when a message's delivery status changes.
///
/// Wire root: `deliveryInfoNotification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfoNotification {
    pub delivery_info: DeliveryInfo,

    #[serde(default)]
    pub callback_data: Option<String>,
}
