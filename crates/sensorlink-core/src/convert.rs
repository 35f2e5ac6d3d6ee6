// ── API-to-domain type conversions ──
//
// Bridges raw `sensorlink_api` wire types into the domain snapshot.
// Placeholder entries are dropped here, so downstream code only ever sees
// legal options.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::IntoEnumIterator;

use sensorlink_api::models::{NodeConfig, OptionEntry, RateEntry};

use crate::cascade::CascadeTable;
use crate::model::{
    Channel, ConfigurationSnapshot, Field, OptionField, OptionItem, OptionValue,
    PowerSetting, TimerSetting,
};
use crate::power::{default_tx_powers, normalize_tx_power};

/// Build a snapshot from one read of `node_id`.
pub fn snapshot_from_config(
    node_id: u32,
    cfg: NodeConfig,
    read_at: DateTime<Utc>,
) -> ConfigurationSnapshot {
    let declared = declared_flags(&cfg);

    let mut rtd_wires = options(&cfg.rtd_wire_options);
    if rtd_wires.is_empty() {
        rtd_wires = CascadeTable::default_rtd_wires();
    }
    let cascade = CascadeTable {
        transducers: options(&cfg.transducer_options),
        thermocouple_sensors: options(&cfg.thermocouple_sensor_options),
        rtd_sensors: options(&cfg.rtd_sensor_options),
        thermistor_sensors: options(&cfg.thermistor_sensor_options),
        rtd_wires,
    };

    let tx_power = power_setting(&cfg);

    let mut channels: Vec<Channel> = cfg
        .channels
        .iter()
        .map(|c| Channel {
            id: c.id,
            enabled: c.enabled,
        })
        .collect();
    channels.sort_by_key(|c| c.id);
    channels.dedup_by_key(|c| c.id);

    ConfigurationSnapshot {
        node_id,
        read_at,
        model: cfg.model,
        serial: cfg.sn,
        firmware: cfg.fw,
        node_address: cfg.node_address,
        state_code: cfg.state,
        state_text: cfg.state_text,
        comm_protocol: cfg.comm_protocol,
        comm_protocol_text: cfg.comm_protocol_text,
        region: cfg.region,
        frequency: cfg.frequency,
        last_comm: cfg.last_comm,
        storage_pct: cfg.storage_pct,
        storage_capacity_raw: cfg.storage_capacity_raw.as_ref().and_then(raw_text),
        sampling_mode: cfg.sampling_mode,
        sample_rate: rate_field(cfg.current_rate.as_ref(), &cfg.supported_rates),
        tx_power,
        channels,
        input_range: option_field(cfg.current_input_range.as_ref(), &cfg.supported_input_ranges),
        unit: option_field(cfg.current_unit.as_ref(), &cfg.unit_options),
        cjc_unit: option_field(cfg.current_cjc_unit.as_ref(), &cfg.cjc_unit_options),
        low_pass_filter: option_field(cfg.current_low_pass.as_ref(), &cfg.low_pass_options),
        storage_limit_mode: option_field(
            cfg.current_storage_limit_mode.as_ref(),
            &cfg.storage_limit_options,
        ),
        data_mode: option_field(cfg.current_data_mode.as_ref(), &cfg.data_mode_options),
        default_mode: option_field(cfg.current_default_mode.as_ref(), &cfg.default_mode_options),
        lost_beacon: TimerSetting {
            value: cfg.current_lost_beacon_timeout,
            enabled: cfg.current_lost_beacon_enabled,
        },
        diagnostic: TimerSetting {
            value: cfg.current_diagnostic_interval,
            enabled: cfg.current_diagnostic_enabled,
        },
        inactivity: TimerSetting {
            value: cfg.current_inactivity_timeout,
            enabled: cfg.current_inactivity_enabled,
        },
        check_radio_interval: cfg.current_check_radio_interval,
        transducer_type: cfg.current_transducer_type.as_ref().and_then(OptionValue::from_json),
        sensor_type: cfg.current_sensor_type.as_ref().and_then(OptionValue::from_json),
        wire_type: cfg.current_wire_type.as_ref().and_then(OptionValue::from_json),
        cascade: Arc::new(cascade),
        declared,
    }
}

// ── Options ──────────────────────────────────────────────────────────

fn option_item(entry: &OptionEntry) -> Option<OptionItem> {
    let value = OptionValue::from_json(&entry.value)?;
    let label = entry
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(|| format!("Value {value}"), str::to_owned);
    if label.eq_ignore_ascii_case("n/a") {
        return None;
    }
    Some(OptionItem {
        value,
        label,
        primary: entry.primary,
    })
}

fn options(entries: &[OptionEntry]) -> Vec<OptionItem> {
    entries.iter().filter_map(option_item).collect()
}

/// Current value plus legal options, both as reported. A current value
/// outside the list stays display-only and never becomes a legal option.
fn option_field(current: Option<&Value>, entries: &[OptionEntry]) -> OptionField {
    OptionField {
        current: current.and_then(OptionValue::from_json),
        options: options(entries),
    }
}

fn rate_field(current: Option<&Value>, rates: &[RateEntry]) -> OptionField {
    let mut options: Vec<OptionItem> = rates
        .iter()
        .filter_map(|r| {
            let value = OptionValue::from_json(&r.enum_val)?;
            let label = r.str_val.clone().unwrap_or_else(|| value.to_string());
            Some(OptionItem::new(value, label))
        })
        .collect();
    let current = current.and_then(OptionValue::from_json);
    if let Some(value) = &current {
        if !options.is_empty() && !options.iter().any(|o| &o.value == value) {
            options.insert(0, OptionItem::new(value.clone(), format!("{value} (unknown)")));
        }
    }
    OptionField { current, options }
}

fn power_setting(cfg: &NodeConfig) -> PowerSetting {
    let mut options: Vec<i64> = cfg
        .supported_powers
        .iter()
        .filter_map(|v| OptionValue::from_json(v)?.as_i64())
        .collect();
    if options.is_empty() {
        options = default_tx_powers(cfg.model.as_deref());
    }
    PowerSetting {
        current: cfg
            .current_power
            .and_then(|p| normalize_tx_power(p, &options)),
        options,
    }
}

fn raw_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ── Capability flags ─────────────────────────────────────────────────

fn declared_flags(cfg: &NodeConfig) -> BTreeMap<Field, bool> {
    Field::iter()
        .filter_map(|field| declared_flag(cfg, field).map(|flag| (field, flag)))
        .collect()
}

fn declared_flag(cfg: &NodeConfig, field: Field) -> Option<bool> {
    let explicit = match field {
        Field::DefaultMode => cfg.supports_default_mode,
        Field::InactivityTimeout => cfg.supports_inactivity_timeout,
        Field::CheckRadioInterval => cfg.supports_check_radio_interval,
        Field::TransducerType => cfg.supports_transducer_type,
        Field::SensorType | Field::WireType => cfg.supports_temp_sensor_options,
        _ => None,
    };
    explicit.or_else(|| cfg.declared_support(field.as_ref()))
}
