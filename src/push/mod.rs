//! Embedded callback servers for push-mode notification delivery.
//!
//! The operator is provisioned with a notify URL pointing at the subscriber's
//! host. Each push category binds its own small HTTP server on a dedicated
//! port and dispatches decoded callback bodies to that category's listener
//! registry.

mod server;

pub use server::PushServer;

use std::net::SocketAddr;

use crate::codec::{self, DecodeError};
use crate::listener::{
    DeliveryStatusPushListener, HlrPushListener, InboundMessagePushListener, ListenerError,
};
use crate::model::{DeliveryInfoNotification, InboundSmsMessageList, RoamingNotification};

/// Errors starting a push callback server.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The configured address could not be bound.
    #[error("failed to bind push callback server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server is already listening on a different address.
    #[error("push callback server already listening on {bound}, refusing rebind on {requested}")]
    AddrMismatch {
        bound: SocketAddr,
        requested: SocketAddr,
    },
}

/// Wire and dispatch glue for one push category.
pub trait PushCategory: Send + Sync + 'static {
    /// Decoded callback payload.
    type Notification: Send + Sync + 'static;

    /// Listener capability payloads are dispatched to.
    type Listener: ?Sized + Send + Sync + 'static;

    /// Category label for logs.
    const CATEGORY: &'static str;

    /// Decode a callback body.
    fn decode(body: &[u8]) -> Result<Self::Notification, DecodeError>;

    /// Hand `notification` to `listener`.
    fn deliver_to(
        listener: &Self::Listener,
        notification: &Self::Notification,
    ) -> Result<(), ListenerError>;
}

/// Delivery status change callbacks, wire root `deliveryInfoNotification`.
pub struct DeliveryStatusPush;

impl PushCategory for DeliveryStatusPush {
    type Notification = DeliveryInfoNotification;
    type Listener = dyn DeliveryStatusPushListener;

    const CATEGORY: &'static str = "delivery-status";

    fn decode(body: &[u8]) -> Result<Self::Notification, DecodeError> {
        codec::decode_root(body, "deliveryInfoNotification")
    }

    fn deliver_to(
        listener: &Self::Listener,
        notification: &Self::Notification,
    ) -> Result<(), ListenerError> {
        listener.on_delivery_status_notification(notification)
    }
}

/// Inbound message batch callbacks, wire root `inboundSMSMessageList`.
pub struct InboundMessagePush;

impl PushCategory for InboundMessagePush {
    type Notification = InboundSmsMessageList;
    type Listener = dyn InboundMessagePushListener;

    const CATEGORY: &'static str = "inbound-messages";

    fn decode(body: &[u8]) -> Result<Self::Notification, DecodeError> {
        codec::decode_root(body, "inboundSMSMessageList")
    }

    fn deliver_to(
        listener: &Self::Listener,
        notification: &Self::Notification,
    ) -> Result<(), ListenerError> {
        listener.on_inbound_message_notification(notification)
    }
}

/// HLR roaming status callbacks, wire root `terminalRoamingStatusList`.
pub struct HlrPush;

impl PushCategory for HlrPush {
    type Notification = RoamingNotification;
    type Listener = dyn HlrPushListener;

    const CATEGORY: &'static str = "hlr-roaming";

    fn decode(body: &[u8]) -> Result<Self::Notification, DecodeError> {
        codec::decode_root(body, "terminalRoamingStatusList")
    }

    fn deliver_to(
        listener: &Self::Listener,
        notification: &Self::Notification,
    ) -> Result<(), ListenerError> {
        listener.on_roaming_notification(notification)
    }
}
