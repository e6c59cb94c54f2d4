//! Fan-out of newly ingested samples to registered observers
//!
//! Each observer is invoked inside its own error boundary: an `Err` return
//! or a panic is logged and skipped, and the remaining observers still run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

use crate::error::Result;
use crate::metrics::Metric;

/// Observer invoked with every newly ingested sample
pub type SubscriberCallback = Arc<dyn Fn(&Metric) -> Result<()> + Send + Sync>;

/// Identifier of a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, SubscriberCallback)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of notifying every observer about one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Observers that returned `Ok`
    pub delivered: usize,
    /// Observers that returned `Err` or panicked
    pub failed: usize,
}

/// Registry of sample observers
#[derive(Default)]
pub struct SubscriptionBus {
    registry: Arc<Mutex<Registry>>,
}

impl SubscriptionBus {
    /// Creates an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Metric) -> Result<()> + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.push((id, Arc::new(callback)));
        debug!(subscription = id.0, "subscriber registered");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Removes an observer; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove(&self.registry, id)
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        lock(&self.registry).subscribers.len()
    }

    /// Whether no observers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifies every observer about `metric`.
    ///
    /// The registry lock is released before any callback runs, so observers
    /// may subscribe or unsubscribe from inside their callback.
    pub fn publish(&self, metric: &Metric) -> DispatchOutcome {
        let subscribers: Vec<(SubscriptionId, SubscriberCallback)> =
            lock(&self.registry).subscribers.clone();

        let mut outcome = DispatchOutcome::default();
        for (id, callback) in subscribers {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(metric))) {
                Ok(Ok(())) => outcome.delivered += 1,
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    warn!(subscription = id.0, metric = %metric.name, "Subscriber callback failed: {}", e);
                }
                Err(payload) => {
                    outcome.failed += 1;
                    warn!(
                        subscription = id.0,
                        metric = %metric.name,
                        "Subscriber callback panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        outcome
    }
}

fn remove(registry: &Mutex<Registry>, id: SubscriptionId) -> bool {
    let mut registry = lock(registry);
    let before = registry.subscribers.len();
    registry.subscribers.retain(|(sid, _)| *sid != id);
    let removed = registry.subscribers.len() != before;
    if removed {
        debug!(subscription = id.0, "subscriber removed");
    }
    removed
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle returned by [`SubscriptionBus::subscribe`].
///
/// Dropping the handle keeps the observer registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Identifier of the observer
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the observer. Returns false if the bus is gone or the
    /// observer was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => remove(&registry, self.id),
            None => false,
        }
    }
}
