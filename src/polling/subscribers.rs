use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// Observers of one client's "new readings" signal.
///
/// Notification carries no payload; subscribers pull the values they need.
#[derive(Clone)]
pub struct Subscribers {
    signal_name: Arc<str>,
    slots: Arc<Mutex<Slots>>,
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("signal_name", &self.signal_name)
            .field("count", &self.len())
            .finish()
    }
}

impl Subscribers {
    pub fn new(signal_name: impl Into<Arc<str>>) -> Self {
        Self { signal_name: signal_name.into(), slots: Arc::default() }
    }

    pub fn signal_name(&self) -> &str {
        &self.signal_name
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut slots = self.slots.lock();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.callbacks.push((id, Arc::new(callback)));
        trace!(signal = %self.signal_name, id, "subscribed");
        Subscription { id, slots: Arc::downgrade(&self.slots) }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback registered at the time of the call.
    ///
    /// The lock is released before any callback runs, so callbacks may
    /// subscribe or unsubscribe freely.
    pub fn notify(&self) -> usize {
        let callbacks: Vec<Callback> = self
            .slots
            .lock()
            .callbacks
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        trace!(signal = %self.signal_name, subscribers = callbacks.len(), "notify");
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }
}

/// Handle of one registered callback. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    slots: Weak<Mutex<Slots>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.lock().callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dropped_subscription_is_not_notified() {
        let subscribers = Subscribers::new("signal_loop_test");
        let hits = Arc::new(AtomicUsize::new(0));

        let first = {
            let hits = hits.clone();
            subscribers.subscribe(move || { hits.fetch_add(1, Ordering::SeqCst); })
        };
        let _second = {
            let hits = hits.clone();
            subscribers.subscribe(move || { hits.fetch_add(10, Ordering::SeqCst); })
        };

        assert_eq!(subscribers.notify(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 11);

        first.unsubscribe();
        assert_eq!(subscribers.notify(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 21);
    }

    #[test]
    fn callback_may_unsubscribe_during_notify() {
        let subscribers = Subscribers::new("signal_loop_test");
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let subscription = {
            let slot = slot.clone();
            let hits = hits.clone();
            subscribers.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                slot.lock().take();
            })
        };
        *slot.lock() = Some(subscription);

        subscribers.notify();
        subscribers.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(subscribers.is_empty());
    }
}
