//! Subscription registry and change dispatch.

use crate::error_sink::{ErrorSink, LogErrorSink, ObserverFailure};
use crate::observer::{Observer, RemovalQueue, SubscriptionId, Unsubscriber};
use cockpit_telemetry_core::{BitField, ChangeEvent, FieldCache, FieldPath, FieldValue};
use opencockpit_errors::ObserverError;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// Counters maintained by a [`Dispatcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Calls to `notify`.
    pub notifications: u64,
    /// Notifications dropped because the value matched the cache.
    pub suppressed: u64,
    /// Observer invocations, including replays.
    pub invocations: u64,
    pub failures: u64,
}

struct Subscription {
    id: SubscriptionId,
    bits: Option<BitField>,
    observer: Box<dyn Observer>,
}

/// Routes changed field values to their observers.
///
/// Observers for one path run in registration order. A failing observer is
/// reported to the error sink and the pass continues with the next one. The
/// dispatcher cannot be borrowed from inside an observer, so the only way to
/// mutate subscriptions mid-pass is an [`Unsubscriber`], whose requests are
/// applied after the pass.
pub struct Dispatcher {
    routes: BTreeMap<FieldPath, Vec<Subscription>>,
    cache: FieldCache,
    pending_removals: RemovalQueue,
    next_id: u64,
    error_sink: Box<dyn ErrorSink>,
    stats: DispatchStats,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("paths", &self.routes.len())
            .field("subscriptions", &self.len())
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
            cache: FieldCache::new(),
            pending_removals: RemovalQueue::default(),
            next_id: 1,
            error_sink: Box::new(LogErrorSink),
            stats: DispatchStats::default(),
        }
    }

    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.set_error_sink(sink);
        self
    }

    pub fn set_error_sink(&mut self, sink: impl ErrorSink + 'static) {
        self.error_sink = Box::new(sink);
    }

    /// Register `observer` for every change of `path`.
    pub fn subscribe(
        &mut self,
        path: impl Into<FieldPath>,
        observer: impl Observer + 'static,
    ) -> SubscriptionId {
        self.insert(path.into(), None, Box::new(observer))
    }

    /// Register `observer` for the bits of a 16-bit register selected by
    /// `bits`. The observer runs whenever the raw register changes, even if
    /// the selected bits did not.
    pub fn subscribe_masked(
        &mut self,
        path: impl Into<FieldPath>,
        bits: BitField,
        observer: impl Observer + 'static,
    ) -> SubscriptionId {
        self.insert(path.into(), Some(bits), Box::new(observer))
    }

    /// Register an observer built from its own [`Unsubscriber`], so it can
    /// remove itself later.
    pub fn subscribe_with<O, F>(&mut self, path: impl Into<FieldPath>, build: F) -> SubscriptionId
    where
        O: Observer + 'static,
        F: FnOnce(Unsubscriber) -> O,
    {
        let id = self.allocate_id();
        let observer = build(Unsubscriber::new(id, &self.pending_removals));
        self.attach(path.into(), id, None, Box::new(observer));
        id
    }

    /// Remove a subscription immediately. Returns `false` if `id` is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut emptied = None;
        let mut removed = false;
        for (path, subs) in self.routes.iter_mut() {
            let before = subs.len();
            subs.retain(|sub| sub.id != id);
            if subs.len() != before {
                removed = true;
                if subs.is_empty() {
                    emptied = Some(path.clone());
                }
                break;
            }
        }
        if let Some(path) = emptied {
            self.routes.remove(&path);
        }
        if removed {
            debug!(subscription = %id, "Removed subscription");
        }
        removed
    }

    /// Deferred-removal handle for `id`.
    pub fn unsubscriber(&self, id: SubscriptionId) -> Unsubscriber {
        Unsubscriber::new(id, &self.pending_removals)
    }

    /// Dispatch one change. The value is compared against the cache first;
    /// an unchanged value invokes nothing. Returns the number of observer
    /// invocations.
    pub fn notify(&mut self, event: &ChangeEvent) -> usize {
        self.flush_removals();
        self.stats.notifications = self.stats.notifications.saturating_add(1);

        if !self.cache.update(&event.path, &event.value) {
            self.stats.suppressed = self.stats.suppressed.saturating_add(1);
            trace!(path = %event.path, "Suppressed unchanged value");
            return 0;
        }

        let invoked = match self.routes.get_mut(&event.path) {
            Some(subs) => deliver(
                subs,
                &event.path,
                &event.value,
                self.error_sink.as_mut(),
                &mut self.stats,
            ),
            None => 0,
        };
        self.flush_removals();
        invoked
    }

    /// Dispatch a batch of changes in order.
    pub fn notify_all<'a>(&mut self, events: impl IntoIterator<Item = &'a ChangeEvent>) -> usize {
        events.into_iter().map(|event| self.notify(event)).sum()
    }

    pub fn get_cached(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.cache.get(path)
    }

    /// Re-deliver every cached value to the observers of its path, as if it
    /// had just changed. Paths without a cached value are skipped. Used after
    /// an output device is re-attached.
    pub fn apply_current_state(&mut self) -> usize {
        self.flush_removals();
        let mut invoked = 0usize;
        for (path, subs) in self.routes.iter_mut() {
            let Some(value) = self.cache.get(path) else {
                continue;
            };
            invoked = invoked.saturating_add(deliver(
                subs,
                path,
                value,
                self.error_sink.as_mut(),
                &mut self.stats,
            ));
        }
        self.flush_removals();
        debug!(invoked, "Applied current state");
        invoked
    }

    /// Forget every cached value (reconnect). Subscriptions are kept.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn is_subscribed(&self, path: &FieldPath) -> bool {
        self.routes.contains_key(path)
    }

    pub fn subscriber_count(&self, path: &FieldPath) -> usize {
        self.routes.get(path).map_or(0, Vec::len)
    }

    pub fn subscribed_paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.routes.keys()
    }

    /// Total number of subscriptions across all paths.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn insert(
        &mut self,
        path: FieldPath,
        bits: Option<BitField>,
        observer: Box<dyn Observer>,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.attach(path, id, bits, observer);
        id
    }

    fn attach(
        &mut self,
        path: FieldPath,
        id: SubscriptionId,
        bits: Option<BitField>,
        observer: Box<dyn Observer>,
    ) {
        debug!(path = %path, subscription = %id, masked = bits.is_some(), "Subscribed");
        self.routes.entry(path).or_default().push(Subscription {
            id,
            bits,
            observer,
        });
    }

    fn flush_removals(&mut self) {
        let pending: Vec<SubscriptionId> = std::mem::take(&mut *self.pending_removals.lock());
        for id in pending {
            self.unsubscribe(id);
        }
    }
}

fn deliver(
    subs: &mut [Subscription],
    path: &FieldPath,
    value: &FieldValue,
    sink: &mut dyn ErrorSink,
    stats: &mut DispatchStats,
) -> usize {
    let mut invoked = 0usize;
    for sub in subs.iter_mut() {
        let outcome = match sub.bits {
            Some(bits) => match bits.apply(value) {
                Some(masked) => sub.observer.receive(&masked),
                None => Err(ObserverError::type_mismatch("register", value.type_name())),
            },
            None => sub.observer.receive(value),
        };
        invoked = invoked.saturating_add(1);
        stats.invocations = stats.invocations.saturating_add(1);
        if let Err(error) = outcome {
            stats.failures = stats.failures.saturating_add(1);
            sink.report(&ObserverFailure {
                path: path.clone(),
                subscription: sub.id,
                error,
            });
        }
    }
    invoked
}
