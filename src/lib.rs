//! Notification dispatch for OneAPI-style SMS messaging APIs.
//!
//! Sending messages and managing subscriptions against these APIs is plain
//! request/response; everything asynchronous lives here. Callers register
//! per-category listeners on a [`SmsClient`] or [`HlrClient`] and the crate
//! does the rest:
//!
//! - **Pull mode**: a background retriever per category polls the operator's
//!   API, advances a watermark cursor past each item, and dispatches newly
//!   observed items to the registered listeners in remote order.
//! - **Push mode**: an embedded callback server per category accepts the
//!   notifications the operator POSTs to the provisioned notify URL and
//!   dispatches the decoded payloads.
//!
//! Workers and servers start lazily on the first registration for a category
//! and stop when that category's listeners are removed. Dropping a client
//! stops everything it started.

pub mod client;
pub mod codec;
pub mod config;
pub mod lifecycle;
pub mod listener;
pub mod model;
pub mod push;
pub mod retriever;
pub mod transport;

pub use client::{ClientError, HlrClient, SmsClient};
pub use config::Config;
