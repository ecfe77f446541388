//! Listener capabilities, one per notification category.
//!
//! Callbacks run on the dispatching worker's task. They should return quickly
//! and report failures through the error return rather than panicking; a
//! failure is logged and never reaches sibling listeners.

use crate::model::{
    DeliveryInfoNotification, DeliveryReport, InboundSmsMessage, InboundSmsMessageList,
    RoamingNotification,
};

/// Error a listener callback may report. Logged, never propagated.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives delivery reports observed by the polling retriever.
pub trait DeliveryReportListener: Send + Sync {
    fn on_delivery_report(&self, report: &DeliveryReport) -> Result<(), ListenerError>;
}

/// Receives inbound messages observed by the polling retriever.
pub trait InboundMessageListener: Send + Sync {
    fn on_inbound_message(&self, message: &InboundSmsMessage) -> Result<(), ListenerError>;
}

/// Receives delivery status notifications posted by the operator.
pub trait DeliveryStatusPushListener: Send + Sync {
    fn on_delivery_status_notification(
        &self,
        notification: &DeliveryInfoNotification,
    ) -> Result<(), ListenerError>;
}

/// Receives inbound message batches posted by the operator.
pub trait InboundMessagePushListener: Send + Sync {
    fn on_inbound_message_notification(
        &self,
        notification: &InboundSmsMessageList,
    ) -> Result<(), ListenerError>;
}

/// Receives roaming status notifications posted by the operator.
pub trait HlrPushListener: Send + Sync {
    fn on_roaming_notification(
        &self,
        notification: &RoamingNotification,
    ) -> Result<(), ListenerError>;
}
