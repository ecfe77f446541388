//! Polling retrievers for pull-mode notification delivery.
//!
//! One retriever per pull category fetches newly observed items on an
//! interval, advances the category watermark past each item, and dispatches it
//! to the registry snapshot. On-demand fetches issued through the client
//! facade run the same cycle, serialized against the background worker, so the
//! watermark advances exactly once per item no matter who fetched it.
//! Selective fetches keep that serialization but stay out of the watermark
//! and the registry entirely.

mod watermark;

pub use watermark::Watermark;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::codec::DecodeError;
use crate::listener::{deliver, ListenerError, SharedRegistry};
use crate::transport::TransportError;

/// Errors a poll cycle can hit. Each aborts only the cycle it occurred in.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("invalid fetch url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Remote feed for one pull category.
///
/// `fetch` returns items oldest-first. Sources that dequeue on read may ignore
/// `newer_than`; the retriever enforces the watermark on its side either way.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// Item produced by the feed.
    type Item: Send + Sync + 'static;

    /// Listener capability items are dispatched to.
    type Listener: ?Sized + Send + Sync + 'static;

    /// Category-specific fetch refinement, e.g. a request id restriction.
    type Filter: Default + Send + Sync;

    /// Category label for logs.
    const CATEGORY: &'static str;

    /// Fetch items newer than `newer_than`, at most `limit` of them when the
    /// remote supports a bound.
    async fn fetch(
        &self,
        filter: &Self::Filter,
        newer_than: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Self::Item>, FetchError>;

    /// True when `filter` narrows the fetch to a subset of the feed.
    ///
    /// A selective cycle hands its items to the caller without advancing the
    /// watermark or dispatching, so items outside the subset still reach the
    /// listeners on later cycles.
    fn is_selective(_filter: &Self::Filter) -> bool {
        false
    }

    /// Identifier the watermark tracks for `item`.
    fn item_id(item: &Self::Item) -> &str;

    /// Hand `item` to `listener`.
    fn deliver_to(listener: &Self::Listener, item: &Self::Item) -> Result<(), ListenerError>;
}

/// Fetch and dispatch engine for one pull category.
pub struct PollingRetriever<S: PollSource> {
    source: S,
    registry: SharedRegistry<S::Listener>,
    /// Guards the watermark for the whole cycle, so background and on-demand
    /// cycles serialize.
    watermark: Mutex<Watermark>,
}

impl<S: PollSource> PollingRetriever<S> {
    /// Create a retriever dispatching to `registry`, starting below every
    /// identifier.
    pub fn new(source: S, registry: SharedRegistry<S::Listener>) -> Self {
        Self {
            source,
            registry,
            watermark: Mutex::new(Watermark::new()),
        }
    }

    /// Run one fetch and dispatch cycle, returning everything the remote sent.
    ///
    /// Items at or below the watermark are returned to the caller but not
    /// re-dispatched. A fetch or decode failure leaves the watermark where it
    /// was. A selective cycle ([`PollSource::is_selective`]) is plain
    /// request/response: its items only go back to the caller, and the
    /// watermark stays put so items outside the selection are still admitted
    /// later.
    pub async fn run_cycle(
        &self,
        filter: &S::Filter,
        limit: Option<u32>,
    ) -> Result<Vec<S::Item>, FetchError> {
        let mut watermark = self.watermark.lock().await;

        let selective = S::is_selective(filter);
        let newer_than = if selective { None } else { watermark.position() };
        let items = self.source.fetch(filter, newer_than, limit).await?;

        if selective {
            debug!(
                category = S::CATEGORY,
                fetched = items.len(),
                "selective fetch, watermark unchanged"
            );
            return Ok(items);
        }

        let snapshot = self.registry.snapshot();

        let mut dispatched = 0usize;
        for item in &items {
            let id = S::item_id(item);
            if !watermark.admits(id) {
                debug!(category = S::CATEGORY, id, "item at or below watermark, skipping");
                continue;
            }
            watermark.advance(id);
            dispatched += 1;
            for listener in &snapshot {
                deliver(S::CATEGORY, listener, |l| S::deliver_to(l, item));
            }
        }

        if !items.is_empty() {
            debug!(
                category = S::CATEGORY,
                fetched = items.len(),
                dispatched,
                listeners = snapshot.len(),
                "poll cycle complete"
            );
        }

        Ok(items)
    }

    /// Poll on `interval` until `stop` signals. Spawned by the coordinator.
    ///
    /// The first cycle runs one interval after start. A cycle failure is
    /// logged and retried on the next tick. Stop interrupts the inter-cycle
    /// wait and cancels an in-flight fetch; dispatch of an already fetched
    /// batch runs to completion.
    pub async fn run(
        self: Arc<Self>,
        interval: Duration,
        limit: Option<u32>,
        mut stop: watch::Receiver<bool>,
    ) {
        info!(
            category = S::CATEGORY,
            interval_ms = interval.as_millis() as u64,
            "polling retriever started"
        );

        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow_and_update() {
                        break;
                    }
                }

                _ = ticker.tick() => {}
            }

            let filter = S::Filter::default();
            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow_and_update() {
                        break;
                    }
                }

                result = self.run_cycle(&filter, limit) => {
                    if let Err(error) = result {
                        warn!(
                            category = S::CATEGORY,
                            error = %error,
                            "poll cycle failed, retrying next interval"
                        );
                    }
                }
            }
        }

        info!(category = S::CATEGORY, "polling retriever stopped");
    }
}
