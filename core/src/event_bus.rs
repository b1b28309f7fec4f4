//! A process-wide topic registry with stable subscription IDs.
//!
//! Subscription IDs are monotonically increasing and stable for the
//! lifetime of the topic; unsubscribing an unknown ID is a no-op. Callbacks
//! run on the caller's (notifying) thread, in subscription order. Fan-out
//! holds no internal lock across a callback, per `spec.md` §9, so a
//! subscriber that calls `subscribe`/`unsubscribe` on this same topic from
//! within its own callback does not deadlock.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An opaque handle returned by [`Topic::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A single-argument-type pub/sub topic. `obscura-core` uses one per event
/// kind (`BlockAdded`, `NewPendingTx`) rather than a single dynamically
/// typed bus, so subscribers never need to downcast.
pub struct Topic<T> {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn Fn(&T) + Send + Sync>)>>,
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Self { next_id: AtomicU64::new(0), subscribers: RwLock::new(Vec::new()) }
    }
}

impl<T> Topic<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback`, returning a stable ID for later
    /// [`Topic::unsubscribe`].
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Removes the subscriber registered under `id`. A no-op if `id` is
    /// unknown (already unsubscribed, or never valid).
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().retain(|(sub_id, _)| *sub_id != id);
    }

    /// Fans `value` out to every current subscriber, in subscription
    /// order. Snapshots the subscriber list under the read lock and
    /// releases it before invoking a single callback, so a reentrant
    /// `subscribe`/`unsubscribe` from inside a callback never deadlocks
    /// against this same topic — `spec.md` §9's "no internal lock across
    /// the callback" strategy.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<_> = self.subscribers.read().iter().map(|(_, cb)| cb.clone()).collect();
        for cb in snapshot {
            cb(value);
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn fan_out_runs_in_subscription_order() {
        let topic: Topic<u32> = Topic::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            topic.subscribe(move |_| order.lock().push(i));
        }
        topic.notify(&1);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribe_removes_callback() {
        let topic: Topic<u32> = Topic::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let id = topic.subscribe(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        topic.notify(&1);
        topic.unsubscribe(id);
        topic.notify(&1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_unknown_id_is_noop() {
        let topic: Topic<u32> = Topic::new();
        topic.subscribe(|_| {});
        topic.unsubscribe(SubscriptionId(9999));
        assert_eq!(topic.subscriber_count(), 1);
    }

    #[test]
    fn reentrant_subscribe_from_a_callback_does_not_deadlock() {
        let topic: Arc<Topic<u32>> = Arc::new(Topic::new());
        let inner = topic.clone();
        let reentrant_calls = Arc::new(AtomicUsize::new(0));
        let reentrant_calls2 = reentrant_calls.clone();
        topic.subscribe(move |_| {
            reentrant_calls2.fetch_add(1, Ordering::SeqCst);
            inner.subscribe(|_| {});
        });
        topic.notify(&1);
        assert_eq!(reentrant_calls.load(Ordering::SeqCst), 1);
        assert_eq!(topic.subscriber_count(), 2);
    }
}
