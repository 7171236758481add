//! Observer capability and subscription handles.

use cockpit_telemetry_core::FieldValue;
use opencockpit_errors::ObserverResult;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Receives the values dispatched for one field path.
///
/// Closures of the form `FnMut(&FieldValue) -> ObserverResult` implement this
/// trait directly.
pub trait Observer: Send {
    fn receive(&mut self, value: &FieldValue) -> ObserverResult;
}

impl<F> Observer for F
where
    F: FnMut(&FieldValue) -> ObserverResult + Send,
{
    fn receive(&mut self, value: &FieldValue) -> ObserverResult {
        self(value)
    }
}

/// Identifies one subscription within a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

pub(crate) type RemovalQueue = Arc<Mutex<Vec<SubscriptionId>>>;

/// Handle that requests removal of a subscription.
///
/// Removal is queued and applied once the dispatch pass in progress (if
/// any) has finished, so an observer holding its own handle may call it from
/// inside `receive`. The handle does not keep the dispatcher alive; calling
/// it after the dispatcher is dropped does nothing.
#[derive(Debug, Clone)]
pub struct Unsubscriber {
    id: SubscriptionId,
    queue: Weak<Mutex<Vec<SubscriptionId>>>,
}

impl Unsubscriber {
    pub(crate) fn new(id: SubscriptionId, queue: &RemovalQueue) -> Self {
        Self {
            id,
            queue: Arc::downgrade(queue),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Queue removal. Returns `false` if the dispatcher no longer exists.
    pub fn unsubscribe(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                let mut pending = queue.lock();
                if !pending.contains(&self.id) {
                    pending.push(self.id);
                }
                true
            }
            None => false,
        }
    }
}
