//! Datagram freshness tracking.
//!
//! Losing the simulator is not an error: the link simply goes idle once no
//! datagram has arrived within the freshness window, and becomes active again
//! on the next one. Each edge is reported exactly once.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_FRESHNESS_WINDOW_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub freshness_window_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
        }
    }
}

impl LinkConfig {
    pub fn with_window(freshness_window_ms: u64) -> Self {
        Self {
            freshness_window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.freshness_window_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Idle,
    Active,
}

impl LinkState {
    pub fn is_active(&self) -> bool {
        matches!(self, LinkState::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    /// First datagram after construction or after the link went idle.
    Established,
    /// Freshness window elapsed without a datagram.
    Lost,
}

#[derive(Debug, Clone)]
pub struct LinkTracker {
    config: LinkConfig,
    last_datagram: Option<Instant>,
    state: LinkState,
    established_count: u64,
}

impl LinkTracker {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            last_datagram: None,
            state: LinkState::Idle,
            established_count: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LinkConfig::default())
    }

    pub fn record_datagram(&mut self, now: Instant) -> Option<LinkTransition> {
        self.last_datagram = Some(now);
        if self.state.is_active() {
            return None;
        }
        self.state = LinkState::Active;
        self.established_count = self.established_count.saturating_add(1);
        debug!(established = self.established_count, "link established");
        Some(LinkTransition::Established)
    }

    /// Whether the last datagram is older than the freshness window.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.age(now)
            .is_some_and(|age| age >= self.config.window())
    }

    pub fn check(&mut self, now: Instant) -> Option<LinkTransition> {
        if self.state.is_active() && self.is_stale(now) {
            self.state = LinkState::Idle;
            debug!(
                window_ms = self.config.freshness_window_ms,
                "link lost: freshness window elapsed"
            );
            return Some(LinkTransition::Lost);
        }
        None
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last_datagram
            .map(|last| now.saturating_duration_since(last))
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Number of idle -> active edges observed.
    pub fn established_count(&self) -> u64 {
        self.established_count
    }
}

impl Default for LinkTracker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
