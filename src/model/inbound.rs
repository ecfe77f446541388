//! Inbound (mobile-originated) message models.

use serde::{Deserialize, Serialize};

/// One mobile-originated message retrieved from or pushed by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundSmsMessage {
    /// Identifier of the message. Also the watermark cursor value.
    pub message_id: String,

    pub sender_address: String,

    pub destination_address: String,

    /// Message text.
    pub message: String,

    /// Submission time as reported by the operator.
    #[serde(default)]
    pub date_time: Option<String>,

    #[serde(default, rename = "resourceURL")]
    pub resource_url: Option<String>,
}

/// Batch of inbound messages.
///
/// Wire root: `inboundSMSMessageList`, both on the polling endpoint and in
/// push callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundSmsMessageList {
    #[serde(default, rename = "inboundSMSMessage")]
    pub inbound_sms_message: Vec<InboundSmsMessage>,

    #[serde(default)]
    pub number_of_messages_in_this_batch: u32,

    #[serde(default)]
    pub total_number_of_pending_messages: u32,

    #[serde(default, rename = "resourceURL")]
    pub resource_url: Option<String>,
}
