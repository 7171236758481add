//! Store release detection by polling per-station counters.

use crate::config::ReleaseConfig;
use crate::constants::weight_to_intensity;
use cockpit_telemetry_core::FieldSnapshot;
use indexmap::IndexMap;

/// A detected release.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseEvent {
    /// Station prefix, e.g. `station_3`.
    pub station: String,
    pub previous: f64,
    /// `None` when the station vanished from the snapshot.
    pub current: Option<f64>,
    /// Store identifier last seen on the station.
    pub identifier: Option<String>,
    pub weight_kg: Option<f64>,
    pub intensity: u8,
}

/// Compares station counters between consecutive snapshots.
///
/// Stations are kept in the order the snapshot lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseDetector {
    counts: IndexMap<String, f64>,
    identifiers: IndexMap<String, String>,
}

impl ReleaseDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `snapshot` against the previous poll.
    ///
    /// A station whose positive count dropped, or which disappeared, is a
    /// release; the first such station in snapshot order is reported and the rest
    /// are ignored for this poll. While `grounded` nothing is reported but
    /// the baseline is still refreshed. A snapshot without the configured
    /// section leaves the baseline untouched.
    pub fn poll(
        &mut self,
        snapshot: &FieldSnapshot,
        grounded: bool,
        config: &ReleaseConfig,
    ) -> Option<ReleaseEvent> {
        let mut present = false;
        let mut counts = IndexMap::new();
        let mut identifiers = IndexMap::new();
        for (leaf, value) in snapshot.section(&config.section) {
            present = true;
            if let Some(station) = leaf.strip_suffix(config.count_suffix.as_str()) {
                if let Some(count) = value.as_f64() {
                    counts.insert(station.to_string(), count);
                }
            } else if let Some(station) = leaf.strip_suffix(config.identifier_suffix.as_str())
                && let Some(identifier) = value.as_str()
            {
                identifiers.insert(station.to_string(), identifier.to_string());
            }
        }
        if !present {
            return None;
        }

        let event = if grounded {
            None
        } else {
            self.counts.iter().find_map(|(station, &previous)| {
                let current = counts.get(station).copied();
                let now = current.unwrap_or(0.0);
                (previous > 0.0 && now < previous).then(|| {
                    let identifier = self.identifiers.get(station).cloned();
                    let weight_kg = identifier.as_deref().and_then(|id| config.weight(id));
                    ReleaseEvent {
                        station: station.clone(),
                        previous,
                        current,
                        identifier,
                        weight_kg,
                        intensity: weight_kg
                            .map_or(config.default_intensity, weight_to_intensity),
                    }
                })
            })
        };

        self.counts = counts;
        self.identifiers = identifiers;
        event
    }

    /// Number of stations in the current baseline.
    pub fn tracked_stations(&self) -> usize {
        self.counts.len()
    }

    pub fn reset(&mut self) {
        self.counts.clear();
        self.identifiers.clear();
    }
}
