//! Clock backed by the tokio timer, so paused test time drives link
//! freshness and effect durations the same way it drives the loop.

use cockpit_telemetry_core::Clock;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_follows_paused_time() {
        let clock = TokioClock;
        let before = clock.now();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(clock.now().duration_since(before), Duration::from_secs(3));
    }
}
