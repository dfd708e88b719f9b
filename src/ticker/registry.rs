//! Observer registry
//!
//! Observers are called synchronously, in registration order. A panicking
//! observer is logged and skipped; delivery to the rest continues.

use super::Snapshot;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

type Observer = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

/// Outcome of delivering one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub panicked: usize,
}

/// Set of observers interested in snapshots
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push((id, observer));
        let count = inner.observers.len();
        drop(inner);

        crate::telemetry::set_gauge(crate::telemetry::GaugeMetric::Subscribers, count as f64);
        tracing::debug!(id, subscribers = count, "Observer subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_registered(&self, id: u64) -> bool {
        self.inner.lock().observers.iter().any(|(oid, _)| *oid == id)
    }

    /// Deliver a snapshot to every registered observer
    ///
    /// The lock is released while observers run, so they may subscribe or
    /// unsubscribe from inside the callback. An observer removed mid-delivery
    /// is not called.
    pub fn broadcast(&self, snapshot: &Snapshot) -> Delivery {
        let observers: Vec<(u64, Observer)> = self.inner.lock().observers.clone();
        let mut delivery = Delivery::default();

        for (id, observer) in observers {
            if !self.is_registered(id) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| observer(snapshot))) {
                Ok(()) => delivery.delivered += 1,
                Err(payload) => {
                    delivery.panicked += 1;
                    let reason = panic_message(payload.as_ref());
                    tracing::error!(id, seq = snapshot.seq, %reason, "Observer panicked");
                    crate::telemetry::increment_counter(
                        crate::telemetry::CounterMetric::ObserverPanics,
                    );
                }
            }
        }

        delivery
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle that removes exactly one observer
///
/// Dropping the handle leaves the observer registered.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the observer; further calls have no effect
    pub fn unsubscribe(&self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut inner = inner.lock();
        let before = inner.observers.len();
        inner.observers.retain(|(id, _)| *id != self.id);
        let count = inner.observers.len();
        drop(inner);

        if count != before {
            crate::telemetry::set_gauge(crate::telemetry::GaugeMetric::Subscribers, count as f64);
            tracing::debug!(id = self.id, subscribers = count, "Observer unsubscribed");
        }
    }
}
