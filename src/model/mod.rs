//! Typed models of the OneAPI wire format.
//!
//! Field names follow the operator's JSON (camelCase, with the API's
//! idiosyncratic acronym casing preserved through explicit renames).

mod delivery;
mod inbound;
mod roaming;

pub use delivery::{DeliveryInfo, DeliveryInfoNotification, DeliveryReport, DeliveryStatus};
pub use inbound::{InboundSmsMessage, InboundSmsMessageList};
pub use roaming::{Roaming, RoamingNotification, ServingMccMnc};
