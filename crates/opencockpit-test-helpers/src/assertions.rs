//! Custom assertion macros for testing.

/// Assert that two floating-point values are approximately equal.
///
/// ```rust
/// use opencockpit_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(1.0_f64, 1.0001, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        let diff = (left - right).abs();
        if diff > tolerance {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`",
                left, right, diff, tolerance
            );
        }
    };
}

/// Assert that a sequence never decreases.
///
/// ```rust
/// use opencockpit_test_helpers::assert_non_decreasing;
///
/// assert_non_decreasing!(&[45u8, 45, 97, 255]);
/// ```
#[macro_export]
macro_rules! assert_non_decreasing {
    ($collection:expr $(,)?) => {
        let collection = $collection;
        let mut iter = collection.iter();
        if let Some(mut prev) = iter.next() {
            for (i, curr) in iter.enumerate() {
                if prev > curr {
                    panic!(
                        "assertion failed: sequence decreases\n  violation at index {}: {:?} > {:?}",
                        i, prev, curr
                    );
                }
                prev = curr;
            }
        }
    };
}

/// Assert the motor commands a [`RecordingSink`](crate::mock::RecordingSink)
/// received for one tick, as `(A, B)`.
///
/// ```rust
/// use cockpit_telemetry_core::{MotorChannel, OutputSink};
/// use opencockpit_test_helpers::{assert_motors, mock::RecordingSink};
///
/// let sink = RecordingSink::new();
/// sink.set_motor(MotorChannel::A, 150);
/// sink.set_motor(MotorChannel::B, 210);
/// assert_motors!(sink, 150, 210);
/// ```
#[cfg(feature = "mock")]
#[macro_export]
macro_rules! assert_motors {
    ($sink:expr, $a:expr, $b:expr $(,)?) => {
        let a = $sink.last_motor($crate::__core::MotorChannel::A);
        let b = $sink.last_motor($crate::__core::MotorChannel::B);
        assert_eq!((a, b), (Some($a), Some($b)), "motor outputs (A, B)");
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0_f64, 1.0001, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.0_f64, 1.1, 0.001);
    }

    #[test]
    fn test_non_decreasing_allows_plateaus() {
        assert_non_decreasing!(&[0, 0, 45, 45, 255]);
    }

    #[test]
    #[should_panic(expected = "sequence decreases")]
    fn test_non_decreasing_fails() {
        assert_non_decreasing!(&[1, 3, 2]);
    }
}
