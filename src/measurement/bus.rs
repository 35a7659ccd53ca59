//! Generic publish/subscribe fan-out.
//!
//! Embedded inside the measurement stream but not coupled to it: any
//! cloneable value type works. Subscribers are opaque tokens, removable
//! exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Opaque token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Fan-out of published values to registered callbacks.
pub struct SubscriptionBus<T> {
    subscribers: Mutex<Vec<(SubscriberId, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Default for SubscriptionBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubscriptionBus<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a callback; the returned token unsubscribes it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap()
            .push((id, Arc::new(callback) as Callback<T>));
        id
    }

    /// Remove a subscription.
    ///
    /// Returns `true` the first time, `false` for unknown or already
    /// removed tokens.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() < before
    }

    /// Invoke every live subscriber with `value`.
    ///
    /// Callbacks run on a snapshot taken outside the lock, so a callback
    /// may subscribe or unsubscribe on this bus without deadlocking.
    /// A subscriber removed mid-publish still receives the in-flight value.
    pub fn publish(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        for callback in snapshot {
            callback(value);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.subscribers.lock().unwrap().clear();
    }
}

impl<T> std::fmt::Debug for SubscriptionBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionBus")
            .field("subscribers", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = SubscriptionBus::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            bus.subscribe(move |v| {
                assert_eq!(*v, 7);
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.publish(&7);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribed_callback_not_invoked() {
        let bus = SubscriptionBus::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        let id = bus.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&1);
        assert!(bus.unsubscribe(id));
        bus.publish(&2);
        bus.publish(&3);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_is_exactly_once() {
        let bus = SubscriptionBus::<()>::new();
        let id = bus.subscribe(|_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_tokens_are_unique_across_resubscription() {
        let bus = SubscriptionBus::<()>::new();
        let first = bus.subscribe(|_| {});
        bus.unsubscribe(first);
        let second = bus.subscribe(|_| {});
        assert_ne!(first, second);
    }

    #[test]
    fn test_publish_with_no_subscribers_is_noop() {
        let bus = SubscriptionBus::<String>::new();
        bus.publish(&"nobody listening".to_string());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let bus = Arc::new(SubscriptionBus::<i32>::new());
        let count = Arc::new(AtomicUsize::new(0));

        let id_slot = Arc::new(Mutex::new(None::<SubscriberId>));
        let bus_inner = Arc::clone(&bus);
        let slot_inner = Arc::clone(&id_slot);
        let count_inner = Arc::clone(&count);
        let id = bus.subscribe(move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot_inner.lock().unwrap() {
                bus_inner.unsubscribe(id);
            }
        });
        *id_slot.lock().unwrap() = Some(id);

        bus.publish(&1);
        bus.publish(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_callback_may_subscribe_on_same_bus() {
        let bus = Arc::new(SubscriptionBus::<i32>::new());
        let bus_inner = Arc::clone(&bus);

        bus.subscribe(move |_| {
            bus_inner.subscribe(|_| {});
        });

        bus.publish(&1);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_clear_removes_everything() {
        let bus = SubscriptionBus::<()>::new();
        bus.subscribe(|_| {});
        bus.subscribe(|_| {});
        assert_eq!(bus.len(), 2);
        bus.clear();
        assert!(bus.is_empty());
    }
}
