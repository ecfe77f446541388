//! Listener capabilities and the per-category registry.
//!
//! Each notification category carries its own listener trait and its own
//! registry instance. Dispatch fans out over a registry snapshot and isolates
//! every callback, so one misbehaving listener cannot block or break the rest.

mod registry;
mod traits;

pub use registry::{deliver, ListenerRegistry, SharedRegistry};
pub use traits::{
    DeliveryReportListener, DeliveryStatusPushListener, HlrPushListener, InboundMessageListener,
    InboundMessagePushListener, ListenerError,
};
