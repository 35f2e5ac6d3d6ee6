// ── Editable node form ──
//
// The operator's working copy of a snapshot. Seeded from the read, edited
// field by field, then handed to the payload builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::warn;

use crate::cascade::{CascadeTable, DependentSelection};
use crate::error::CoreError;
use crate::model::option::contains;
use crate::model::{ConfigurationSnapshot, Field, FieldKind, OptionItem, OptionValue};

#[derive(Debug, Clone, Serialize)]
pub struct NodeForm {
    node_id: u32,
    sample_rate: Option<OptionValue>,
    tx_power: Option<i64>,
    channels: BTreeMap<u32, bool>,
    values: BTreeMap<Field, Option<OptionValue>>,
    timer_enabled: BTreeMap<Field, bool>,
    selection: DependentSelection,
    #[serde(skip)]
    cascade: Arc<CascadeTable>,
}

impl NodeForm {
    pub fn from_snapshot(snapshot: &ConfigurationSnapshot) -> Self {
        let values = Field::iter()
            .filter(|f| f.kind() != FieldKind::Dependent)
            .map(|f| (f, seed_value(snapshot, f)))
            .collect();
        let timer_enabled = Field::iter()
            .filter_map(|f| Some((f, snapshot.timer(f)?.enabled?)))
            .collect();
        let selection = DependentSelection::seed(
            &snapshot.cascade,
            snapshot.transducer_type.clone(),
            snapshot.sensor_type.clone(),
            snapshot.wire_type.clone(),
        );
        Self {
            node_id: snapshot.node_id,
            sample_rate: snapshot.sample_rate.current.clone(),
            tx_power: snapshot
                .tx_power
                .current
                .or_else(|| snapshot.tx_power.options.first().copied()),
            channels: snapshot.channels.iter().map(|c| (c.id, c.enabled)).collect(),
            values,
            timer_enabled,
            selection,
            cascade: Arc::clone(&snapshot.cascade),
        }
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    // ── Required fields ──────────────────────────────────────────────

    pub fn sample_rate(&self) -> Option<&OptionValue> {
        self.sample_rate.as_ref()
    }

    pub fn set_sample_rate(&mut self, rate: Option<OptionValue>) {
        self.sample_rate = rate;
    }

    pub fn tx_power(&self) -> Option<i64> {
        self.tx_power
    }

    pub fn set_tx_power(&mut self, dbm: i64) {
        self.tx_power = Some(dbm);
    }

    // ── Channels ─────────────────────────────────────────────────────

    /// Enabled channel ids, ascending.
    pub fn enabled_channels(&self) -> Vec<u32> {
        self.channels
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn set_channel(&mut self, id: u32, enabled: bool) -> Result<(), CoreError> {
        let slot = self
            .channels
            .get_mut(&id)
            .ok_or_else(|| CoreError::InvalidOption {
                field: "channels".into(),
                value: id.to_string(),
            })?;
        *slot = enabled;
        Ok(())
    }

    /// Enable exactly `ids`; every other channel is disabled.
    pub fn set_enabled_channels(&mut self, ids: &[u32]) -> Result<(), CoreError> {
        if let Some(unknown) = ids.iter().find(|id| !self.channels.contains_key(id)) {
            return Err(CoreError::InvalidOption {
                field: "channels".into(),
                value: unknown.to_string(),
            });
        }
        for (id, enabled) in &mut self.channels {
            *enabled = ids.contains(id);
        }
        Ok(())
    }

    // ── Optional fields ──────────────────────────────────────────────

    /// Current form value of an optional field. `None` is the empty sentinel.
    pub fn value(&self, field: Field) -> Option<&OptionValue> {
        match field {
            Field::TransducerType => self.selection.transducer.as_ref(),
            Field::SensorType => self.selection.sensor.as_ref(),
            Field::WireType => self.selection.wire.as_ref(),
            other => self.values.get(&other).and_then(Option::as_ref),
        }
    }

    /// Set an optional field. Changing the transducer re-runs the cascade.
    pub fn set_value(&mut self, field: Field, value: Option<OptionValue>) {
        match field {
            Field::TransducerType => {
                let table = Arc::clone(&self.cascade);
                self.selection.set_transducer(&table, value);
            }
            Field::SensorType => self.selection.sensor = value,
            Field::WireType => self.selection.wire = value,
            other => {
                self.values.insert(other, value);
            }
        }
    }

    // ── Timer enable flags ───────────────────────────────────────────

    /// Enable flag for a timer, when the node reported one or the operator
    /// set it. `None` leaves the backend to derive it from the value.
    pub fn timer_enabled(&self, field: Field) -> Option<bool> {
        self.timer_enabled.get(&field).copied()
    }

    pub fn set_timer_enabled(&mut self, field: Field, enabled: bool) -> Result<(), CoreError> {
        if !field.has_enable_flag() {
            return Err(CoreError::InvalidOption {
                field: field.to_string(),
                value: "enabled".into(),
            });
        }
        self.timer_enabled.insert(field, enabled);
        Ok(())
    }

    pub fn selection(&self) -> &DependentSelection {
        &self.selection
    }

    pub fn cascade(&self) -> &CascadeTable {
        &self.cascade
    }

    /// Legal sensor types for the selected transducer.
    pub fn sensor_domain(&self) -> &[OptionItem] {
        self.cascade.sensor_domain(self.selection.transducer.as_ref())
    }

    /// Legal wire types for the selected transducer (empty unless RTD).
    pub fn wire_domain(&self) -> &[OptionItem] {
        self.cascade.wire_domain(self.selection.transducer.as_ref())
    }
}

/// Reported value of `field`, except that an enumerated value outside its
/// non-empty option list seeds the form with the first legal option.
fn seed_value(snapshot: &ConfigurationSnapshot, field: Field) -> Option<OptionValue> {
    let current = snapshot.current(field);
    let fallback = snapshot
        .option_field(field)
        .and_then(|f| f.options.first().map(|first| (f.options.as_slice(), first)))
        .filter(|(options, _)| current.as_ref().is_some_and(|v| !contains(options, v)));
    match fallback {
        Some((_, first)) => {
            warn!(
                node_id = snapshot.node_id,
                field = %field,
                reported = ?current,
                fallback = %first.value,
                "reported value not among legal options"
            );
            Some(first.value.clone())
        }
        None => current,
    }
}
