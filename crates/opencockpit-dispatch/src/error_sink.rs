//! Where isolated observer failures are reported.

use crate::observer::SubscriptionId;
use cockpit_telemetry_core::FieldPath;
use opencockpit_errors::ObserverError;
use std::fmt;
use tracing::warn;

/// One observer invocation that returned an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverFailure {
    pub path: FieldPath,
    pub subscription: SubscriptionId,
    pub error: ObserverError,
}

impl fmt::Display for ObserverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observer {} on {} failed: {}",
            self.subscription, self.path, self.error
        )
    }
}

/// Receives observer failures. Closures `FnMut(&ObserverFailure) + Send`
/// implement it.
pub trait ErrorSink: Send {
    fn report(&mut self, failure: &ObserverFailure);
}

impl<F> ErrorSink for F
where
    F: FnMut(&ObserverFailure) + Send,
{
    fn report(&mut self, failure: &ObserverFailure) {
        self(failure);
    }
}

/// Default sink: logs every failure with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&mut self, failure: &ObserverFailure) {
        warn!(
            path = %failure.path,
            subscription = failure.subscription.get(),
            severity = %failure.error.severity(),
            error = %failure.error,
            "Observer failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display() {
        let failure = ObserverFailure {
            path: FieldPath::address(0x7408),
            subscription: SubscriptionId(2),
            error: ObserverError::failed("device gone"),
        };
        assert_eq!(
            failure.to_string(),
            "observer sub#2 on 0x7408 failed: device gone"
        );
    }
}
