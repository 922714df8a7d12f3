//! Relay lifecycle tracking.
//!
//! # Responsibilities
//! - Count open upstream relays
//! - Tie each upstream byte stream to a guard released exactly once
//! - Notice when the client goes away before the upstream finished
//!
//! The guard lives inside the response body stream. It is released on the
//! final poll (completion or upstream error), or on drop when the client
//! hangs up first and hyper discards the body.

use std::fmt::Display;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;

use crate::observability::metrics;

static RELAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a relay, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(u64);

impl RelayId {
    pub fn new() -> Self {
        Self(RELAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RelayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "relay-{}", self.0)
    }
}

/// Counts relays that still hold an upstream resource.
#[derive(Debug, Clone, Default)]
pub struct RelayTracker {
    active_count: Arc<AtomicU64>,
}

impl RelayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new relay. The returned guard releases it on drop.
    pub fn track(&self) -> RelayGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::relay_opened();
        RelayGuard {
            active_count: Arc::clone(&self.active_count),
            id: RelayId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Holds one relay slot. Decrements the active count when dropped.
#[derive(Debug)]
pub struct RelayGuard {
    active_count: Arc<AtomicU64>,
    id: RelayId,
}

impl RelayGuard {
    pub fn id(&self) -> RelayId {
        self.id
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::relay_closed();
        tracing::trace!(relay_id = %self.id, "Relay released");
    }
}

/// Upstream byte stream that owns its relay guard.
///
/// The guard is released when the stream ends or fails. A body dropped
/// before that releases it on drop.
pub struct RelayBody<S> {
    inner: S,
    id: RelayId,
    guard: Option<RelayGuard>,
}

impl<S> RelayBody<S> {
    pub fn new(inner: S, guard: RelayGuard) -> Self {
        Self {
            inner,
            id: guard.id(),
            guard: Some(guard),
        }
    }

    /// True once the upstream stream has ended or failed.
    pub fn is_finished(&self) -> bool {
        self.guard.is_none()
    }
}

impl<S, E> Stream for RelayBody<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.is_finished() {
            return Poll::Ready(None);
        }

        let polled = Pin::new(&mut self.inner).poll_next(cx);
        match &polled {
            Poll::Ready(None) => {
                tracing::debug!(relay_id = %self.id, "Upstream stream complete");
                self.guard.take();
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::error!(relay_id = %self.id, error = %e, "Upstream stream failed mid-relay");
                self.guard.take();
            }
            _ => {}
        }
        polled
    }
}

impl<S> Drop for RelayBody<S> {
    fn drop(&mut self) {
        if !self.is_finished() {
            tracing::info!(relay_id = %self.id, "Client disconnected, dropping upstream stream");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{stream, StreamExt};

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn relay_ids_are_unique() {
        assert_ne!(RelayId::new(), RelayId::new());
    }

    #[test]
    fn tracker_counts_guards() {
        let tracker = RelayTracker::new();
        let g1 = tracker.track();
        let g2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        drop(g1);
        assert_eq!(tracker.active_count(), 1);
        drop(g2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn body_relays_chunks_in_order_and_releases() {
        let tracker = RelayTracker::new();
        let mut body = RelayBody::new(chunks(&["b1", "b2", "b3"]), tracker.track());

        let mut relayed = Vec::new();
        while let Some(chunk) = body.next().await {
            relayed.push(chunk.unwrap());
        }
        assert_eq!(relayed, vec!["b1", "b2", "b3"]);
        assert!(body.is_finished());
        assert_eq!(tracker.active_count(), 0);

        // Polling past the end neither yields nor releases twice.
        assert!(body.next().await.is_none());
        drop(body);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn early_drop_releases() {
        let tracker = RelayTracker::new();
        let mut body = RelayBody::new(chunks(&["b1", "b2"]), tracker.track());
        assert!(body.next().await.is_some());
        drop(body);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn stream_error_ends_relay() {
        let tracker = RelayTracker::new();
        let inner = stream::iter(vec![
            Ok(Bytes::from_static(b"b1")),
            Err(std::io::Error::other("reset")),
            Ok(Bytes::from_static(b"never")),
        ]);
        let mut body = RelayBody::new(inner, tracker.track());

        assert!(body.next().await.unwrap().is_ok());
        assert_eq!(tracker.active_count(), 1);
        assert!(body.next().await.unwrap().is_err());
        assert_eq!(tracker.active_count(), 0);
        assert!(body.next().await.is_none());
        drop(body);
        assert_eq!(tracker.active_count(), 0);
    }
}
