// ── Configuration snapshot ──
//
// Domain view of one read. Immutable once built; every read replaces it
// wholesale.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::channel::Channel;
use super::field::Field;
use super::option::{OptionItem, OptionValue, label_of};
use crate::cascade::CascadeTable;

/// Current value plus legal choices of an enumerated field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionField {
    pub current: Option<OptionValue>,
    pub options: Vec<OptionItem>,
}

impl OptionField {
    pub fn current_label(&self) -> Option<&str> {
        label_of(&self.options, self.current.as_ref()?)
    }
}

/// A timeout/interval and its enable flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerSetting {
    pub value: Option<i64>,
    pub enabled: Option<bool>,
}

/// Transmit power in dBm and the legal set for this node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PowerSetting {
    pub current: Option<i64>,
    pub options: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationSnapshot {
    pub node_id: u32,
    pub read_at: DateTime<Utc>,

    // ── Identity ──
    pub model: Option<String>,
    pub serial: Option<String>,
    pub firmware: Option<String>,
    pub node_address: Option<String>,

    // ── Operating state & comms ──
    pub state_code: Option<i64>,
    pub state_text: Option<String>,
    pub comm_protocol: Option<i64>,
    pub comm_protocol_text: Option<String>,
    pub region: Option<String>,
    pub frequency: Option<String>,
    pub last_comm: Option<String>,

    // ── Storage ──
    pub storage_pct: Option<f64>,
    pub storage_capacity_raw: Option<String>,
    pub sampling_mode: Option<String>,

    // ── Radio & channels ──
    pub sample_rate: OptionField,
    pub tx_power: PowerSetting,
    pub channels: Vec<Channel>,

    // ── Enumerated fields ──
    pub input_range: OptionField,
    pub unit: OptionField,
    pub cjc_unit: OptionField,
    pub low_pass_filter: OptionField,
    pub storage_limit_mode: OptionField,
    pub data_mode: OptionField,
    pub default_mode: OptionField,

    // ── Timers ──
    pub lost_beacon: TimerSetting,
    pub diagnostic: TimerSetting,
    pub inactivity: TimerSetting,
    pub check_radio_interval: Option<i64>,

    // ── Transducer / sensor / wire ──
    pub transducer_type: Option<OptionValue>,
    pub sensor_type: Option<OptionValue>,
    pub wire_type: Option<OptionValue>,
    pub cascade: Arc<CascadeTable>,

    /// Explicit capability flags reported by the backend, per field.
    pub declared: BTreeMap<Field, bool>,
}

impl ConfigurationSnapshot {
    /// Operating-state code 0 means idle.
    pub fn reports_idle(&self) -> bool {
        self.state_code == Some(0)
    }

    pub fn declared(&self, field: Field) -> Option<bool> {
        self.declared.get(&field).copied()
    }

    /// The enumerated field backing `field`, if it has a fixed option list.
    pub fn option_field(&self, field: Field) -> Option<&OptionField> {
        match field {
            Field::InputRange => Some(&self.input_range),
            Field::Unit => Some(&self.unit),
            Field::CjcUnit => Some(&self.cjc_unit),
            Field::LowPassFilter => Some(&self.low_pass_filter),
            Field::StorageLimitMode => Some(&self.storage_limit_mode),
            Field::DataMode => Some(&self.data_mode),
            Field::DefaultMode => Some(&self.default_mode),
            _ => None,
        }
    }

    /// Timer backing `field`, for the timers that carry an enable flag.
    pub fn timer(&self, field: Field) -> Option<&TimerSetting> {
        match field {
            Field::LostBeaconTimeout => Some(&self.lost_beacon),
            Field::DiagnosticInterval => Some(&self.diagnostic),
            Field::InactivityTimeout => Some(&self.inactivity),
            _ => None,
        }
    }

    /// Value the node currently reports for `field`.
    pub fn current(&self, field: Field) -> Option<OptionValue> {
        match field {
            Field::LostBeaconTimeout => self.lost_beacon.value.map(OptionValue::from),
            Field::DiagnosticInterval => self.diagnostic.value.map(OptionValue::from),
            Field::InactivityTimeout => self.inactivity.value.map(OptionValue::from),
            Field::CheckRadioInterval => self.check_radio_interval.map(OptionValue::from),
            Field::TransducerType => self.transducer_type.clone(),
            Field::SensorType => self.sensor_type.clone(),
            Field::WireType => self.wire_type.clone(),
            other => self.option_field(other).and_then(|f| f.current.clone()),
        }
    }

    pub fn enabled_channels(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .channels
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Label of the current sample rate (e.g. `"1Hz"`).
    pub fn sample_rate_label(&self) -> Option<&str> {
        self.sample_rate.current_label()
    }
}
