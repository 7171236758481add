//! Mapping tables: loading, validation and installation on a dispatcher.

use crate::rule::{MappingRule, Signal, Transform};
use cockpit_telemetry_core::{FieldValue, IndicatorId, OutputSink, VehicleIdentity};
use opencockpit_dispatch::{Dispatcher, SubscriptionId};
use opencockpit_errors::{ConfigError, ObserverResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Current mapping file schema.
pub const MAPPING_SCHEMA_VERSION: u8 = 1;

fn current_schema() -> u8 {
    MAPPING_SCHEMA_VERSION
}

/// A versioned list of mapping rules, optionally bound to one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingTable {
    #[serde(default = "current_schema")]
    pub schema_version: u8,
    /// Normalized vehicle name the rules were written for; `None` applies to
    /// every vehicle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub rules: Vec<MappingRule>,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self {
            schema_version: MAPPING_SCHEMA_VERSION,
            vehicle: None,
            rules: Vec::new(),
        }
    }
}

impl MappingTable {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn for_vehicle(mut self, vehicle: impl Into<String>) -> Self {
        self.vehicle = Some(vehicle.into());
        self
    }

    /// Parse and validate a table. `origin` names the source in errors.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let table: MappingTable =
            serde_yaml::from_str(text).map_err(|e| ConfigError::parse(origin, e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read(&origin, e))?;
        let table = Self::from_yaml_str(&text, &origin)?;
        info!(
            path = %origin,
            rules = table.rules.len(),
            vehicle = table.vehicle.as_deref().unwrap_or("any"),
            "Loaded mapping table"
        );
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != MAPPING_SCHEMA_VERSION {
            return Err(ConfigError::invalid(
                "mappings.schema_version",
                format!(
                    "unsupported version {} (expected {MAPPING_SCHEMA_VERSION})",
                    self.schema_version
                ),
            ));
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(bits) = rule.bits
                && bits.mask == 0
            {
                return Err(ConfigError::invalid(
                    format!("mappings.rules[{index}].bits.mask"),
                    "mask selects no bits",
                ));
            }
            if let Transform::Scale { factor, .. } = rule.transform
                && (!factor.is_finite() || factor < 0.0)
            {
                return Err(ConfigError::invalid(
                    format!("mappings.rules[{index}].transform.scale.factor"),
                    format!("factor must be finite and non-negative, got {factor}"),
                ));
            }
        }
        Ok(())
    }

    /// Whether the rules apply to `identity`. Matching is case-insensitive
    /// against the normalized and the raw name.
    pub fn applies_to(&self, identity: &VehicleIdentity) -> bool {
        self.vehicle.as_deref().is_none_or(|vehicle| {
            vehicle.eq_ignore_ascii_case(&identity.normalized)
                || vehicle.eq_ignore_ascii_case(&identity.raw)
        })
    }

    /// Every indicator the table drives, without duplicates.
    pub fn targets(&self) -> Vec<IndicatorId> {
        self.rules
            .iter()
            .map(|rule| rule.action.target().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Drive every target to its dark state.
    pub fn quiesce(&self, sink: &dyn OutputSink) {
        for rule in &self.rules {
            rule.action.quiesce(sink);
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Subscribe one observer per rule, each writing to `sink`.
    ///
    /// An observer acts only when its transformed signal differs from the
    /// last one it wrote, so a masked rule ignores changes to other bits of
    /// the same register.
    pub fn install(
        &self,
        dispatcher: &mut Dispatcher,
        sink: Arc<dyn OutputSink>,
    ) -> InstalledMappings {
        let mut installed = InstalledMappings::default();
        for rule in &self.rules {
            let last: Arc<Mutex<Option<Signal>>> = Arc::default();
            let observer = rule_observer(rule.clone(), Arc::clone(&last), Arc::clone(&sink));
            let id = match rule.bits {
                Some(bits) => dispatcher.subscribe_masked(rule.path.clone(), bits, observer),
                None => dispatcher.subscribe(rule.path.clone(), observer),
            };
            installed.subscriptions.push(id);
            installed.last_signals.push(last);
        }
        debug!(rules = installed.len(), "Installed mapping rules");
        installed
    }
}

fn rule_observer(
    rule: MappingRule,
    last: Arc<Mutex<Option<Signal>>>,
    sink: Arc<dyn OutputSink>,
) -> impl FnMut(&FieldValue) -> ObserverResult + Send + 'static {
    move |value: &FieldValue| -> ObserverResult {
        let signal = rule.transform.apply(value)?;
        let mut last = last.lock();
        if *last == Some(signal) {
            return Ok(());
        }
        debug!(rule = %rule.label(), target = %rule.action.target(), %signal, "Mapping output");
        *last = Some(signal);
        rule.action.perform(signal, sink.as_ref());
        Ok(())
    }
}

/// Subscriptions created by [`MappingTable::install`].
#[derive(Debug, Default)]
pub struct InstalledMappings {
    subscriptions: Vec<SubscriptionId>,
    last_signals: Vec<Arc<Mutex<Option<Signal>>>>,
}

impl InstalledMappings {
    pub fn subscriptions(&self) -> &[SubscriptionId] {
        &self.subscriptions
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Forget what each rule last wrote so the next delivery drives its
    /// output again (device reconnected).
    pub fn invalidate(&self) {
        for last in &self.last_signals {
            *last.lock() = None;
        }
    }

    /// Remove every subscription; returns how many were still present.
    pub fn uninstall(self, dispatcher: &mut Dispatcher) -> usize {
        self.subscriptions
            .into_iter()
            .filter(|id| dispatcher.unsubscribe(*id))
            .count()
    }
}
