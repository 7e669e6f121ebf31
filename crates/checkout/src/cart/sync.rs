//! Cross-surface cart change notifications.
//!
//! Every UI surface that renders cart state (cart page, header mini-cart,
//! product page indicators) subscribes here and re-reads [`super::CartStore`]
//! when poked. Events carry no payload on purpose: subscribers always
//! re-run their own read against the store instead of applying pushed data,
//! so a slow surface can never paint a stale snapshot it received earlier.
//!
//! Delivery is at-least-once. A subscriber that lags far enough behind to
//! drop events observes a single coalesced [`CartEvent::Changed`] - which
//! is indistinguishable from the events it missed, because the reaction to
//! any number of changes is the same one re-fetch.

use tokio::sync::broadcast;

/// Capacity of the broadcast channel. Subscribers coalesce on lag, so this
/// only bounds memory, not correctness.
const CHANNEL_CAPACITY: usize = 16;

/// A cart change notification. Carries no data by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    /// The cart changed; re-read the store.
    Changed,
}

/// In-process publish/subscribe channel for cart changes.
///
/// Cheap to clone; all clones publish into the same channel. Publishing
/// never fails and never blocks, including when nobody is subscribed.
#[derive(Clone, Debug)]
pub struct CartSyncBus {
    tx: broadcast::Sender<CartEvent>,
}

impl CartSyncBus {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Announce that the cart changed.
    ///
    /// Called after every successful server mutation - by the cart store
    /// itself, and by any other mutation path that bypasses it.
    pub fn publish(&self) {
        // A send error only means there are no subscribers right now.
        let _ = self.tx.send(CartEvent::Changed);
    }

    /// Subscribe for change notifications.
    ///
    /// Only events published after this call are observed.
    #[must_use]
    pub fn subscribe(&self) -> CartWatcher {
        CartWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscribers (diagnostics only).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for CartSyncBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the bus.
pub struct CartWatcher {
    rx: broadcast::Receiver<CartEvent>,
}

impl CartWatcher {
    /// Wait for the next change notification.
    ///
    /// Returns `None` when the bus (every sender) has been dropped. Lag is
    /// coalesced: after missing events, the next call returns a single
    /// [`CartEvent::Changed`] rather than an error, preserving the
    /// at-least-once contract.
    pub async fn changed(&mut self) -> Option<CartEvent> {
        match self.rx.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "cart watcher lagged; coalescing to one event");
                Some(CartEvent::Changed)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

impl std::fmt::Debug for CartWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartWatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = CartSyncBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish();

        assert_eq!(first.changed().await, Some(CartEvent::Changed));
        assert_eq!(second.changed().await, Some(CartEvent::Changed));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let bus = CartSyncBus::new();
        bus.publish();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lag_coalesces_instead_of_erroring() {
        let bus = CartSyncBus::new();
        let mut watcher = bus.subscribe();

        // Overflow the channel so the receiver is forced to lag.
        for _ in 0..(CHANNEL_CAPACITY * 2 + 1) {
            bus.publish();
        }

        // First recv hits the lag path and still yields a change.
        assert_eq!(watcher.changed().await, Some(CartEvent::Changed));
    }

    #[tokio::test]
    async fn test_closed_bus_ends_the_stream() {
        let bus = CartSyncBus::new();
        let mut watcher = bus.subscribe();
        drop(bus);
        assert_eq!(watcher.changed().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_sees_only_future_events() {
        let bus = CartSyncBus::new();
        bus.publish();

        let mut watcher = bus.subscribe();
        bus.publish();

        // Exactly one event: the publish before subscribing is invisible.
        assert_eq!(watcher.changed().await, Some(CartEvent::Changed));
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(20), watcher.changed())
                .await
                .is_err()
        );
    }
}
