// Backend API request and response types
//
// Every JSON response may carry `success`, `error` and `message`; the client
// strips that envelope before these types are deserialized. Fields use
// `#[serde(default)]` liberally because the backend omits keys it could not
// read from the node, and numeric fields sometimes arrive as strings.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;

// ── Generic acknowledgement ──────────────────────────────────────────

/// Body of a successful command (`probe`, `sleep`, `write`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandAck {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Node configuration snapshot ──────────────────────────────────────

/// One legal choice for an enumerated field: `{value, label, primary?}`.
///
/// `value` is kept as raw JSON; the backend mixes numbers and numeric
/// strings for the same field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub value: Value,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

/// A supported sample rate: `{enum_val, str_val}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub enum_val: Value,
    #[serde(default)]
    pub str_val: Option<String>,
}

/// One channel toggle: `{id, enabled}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub id: u32,
    #[serde(default)]
    pub enabled: bool,
}

/// Full configuration read from `GET /api/read/{node}`.
///
/// Field names follow the backend verbatim. Capability flags the backend
/// does not model explicitly (e.g. `supports_input_range`) land in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    // ── Identity ──
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sn: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub fw: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub node_address: Option<String>,

    // ── Operating state & comms ──
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub state: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub state_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_comm: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub comm_protocol: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub comm_protocol_text: Option<String>,

    // ── Storage ──
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub storage_pct: Option<f64>,
    #[serde(default)]
    pub storage_capacity_raw: Option<Value>,

    // ── Sampling / data mode ──
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sampling_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub sampling_mode_raw: Option<i64>,
    #[serde(default, alias = "data_mode")]
    pub current_data_mode: Option<Value>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub data_mode_text: Option<String>,
    #[serde(default)]
    pub data_mode_options: Vec<OptionEntry>,

    // ── Radio ──
    #[serde(default)]
    pub current_rate: Option<Value>,
    #[serde(default)]
    pub supported_rates: Vec<RateEntry>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_power: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_power_enum: Option<i64>,
    /// Legal transmit powers in dBm, when the backend reports them.
    #[serde(default)]
    pub supported_powers: Vec<Value>,

    // ── Channels & input ──
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
    #[serde(default)]
    pub current_input_range: Option<Value>,
    #[serde(default)]
    pub supported_input_ranges: Vec<OptionEntry>,
    #[serde(default)]
    pub current_unit: Option<Value>,
    #[serde(default)]
    pub unit_options: Vec<OptionEntry>,
    #[serde(default)]
    pub current_cjc_unit: Option<Value>,
    #[serde(default)]
    pub cjc_unit_options: Vec<OptionEntry>,
    #[serde(default)]
    pub current_low_pass: Option<Value>,
    #[serde(default)]
    pub low_pass_options: Vec<OptionEntry>,
    #[serde(default)]
    pub current_storage_limit_mode: Option<Value>,
    #[serde(default)]
    pub storage_limit_options: Vec<OptionEntry>,

    // ── Timers ──
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_lost_beacon_timeout: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub current_lost_beacon_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_diagnostic_interval: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub current_diagnostic_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_inactivity_timeout: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub current_inactivity_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub current_check_radio_interval: Option<i64>,

    // ── Default mode ──
    #[serde(default)]
    pub current_default_mode: Option<Value>,
    #[serde(default)]
    pub default_mode_options: Vec<OptionEntry>,

    // ── Transducer / sensor / wire ──
    #[serde(default)]
    pub current_transducer_type: Option<Value>,
    #[serde(default)]
    pub current_sensor_type: Option<Value>,
    #[serde(default)]
    pub current_wire_type: Option<Value>,
    #[serde(default)]
    pub transducer_options: Vec<OptionEntry>,
    #[serde(default)]
    pub thermocouple_sensor_options: Vec<OptionEntry>,
    #[serde(default)]
    pub rtd_sensor_options: Vec<OptionEntry>,
    #[serde(default)]
    pub thermistor_sensor_options: Vec<OptionEntry>,
    #[serde(default)]
    pub rtd_wire_options: Vec<OptionEntry>,

    // ── Explicit capability flags ──
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub supports_default_mode: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub supports_inactivity_timeout: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub supports_check_radio_interval: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub supports_transducer_type: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub supports_temp_sensor_options: Option<bool>,

    /// Everything else the backend sends, including ad hoc `supports_*` flags.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl NodeConfig {
    /// Look up an ad hoc `supports_{field}` flag from `extra`.
    pub fn declared_support(&self, field: &str) -> Option<bool> {
        match self.extra.get(&format!("supports_{field}"))? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────

/// A named feature flag from `GET /api/diagnostics/{node}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticFlag {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default)]
    pub flags: Vec<DiagnosticFlag>,
}

// ── Idle ─────────────────────────────────────────────────────────────

/// Sub-status of an idle command: was it sent, is the link alive, did the
/// node report idle afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleStatus {
    #[serde(default)]
    pub command_sent: bool,
    #[serde(default)]
    pub transport_alive: bool,
    #[serde(default)]
    pub state_confirmed: bool,
    #[serde(default)]
    pub state_text: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of `POST /api/node_idle/{node}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdleAck {
    #[serde(default)]
    pub idle_confirmed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub idle_result: Option<Value>,
    #[serde(default)]
    pub idle_status: IdleStatus,
}

// ── Write ────────────────────────────────────────────────────────────

/// Body of `POST /api/write`.
///
/// Optional fields are tri-state: the outer `None` omits the key
/// (unsupported on this node), `Some(None)` sends `null` (clear),
/// `Some(Some(v))` sends the value. Timer enable flags are plain options:
/// when omitted the backend enables a timer iff its value is positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub node_id: u32,
    pub sample_rate: i64,
    pub tx_power: i64,
    pub channels: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_range: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cjc_unit: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_pass_filter: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_limit_mode: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mode: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_beacon_timeout: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_interval: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_radio_interval: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_beacon_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transducer_type: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_type: Option<Option<i64>>,
}

// ── Sampling ─────────────────────────────────────────────────────────

/// Where sampled data goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTransmitMode {
    Log,
    #[default]
    Transmit,
    LogAndTransmit,
}

impl LogTransmitMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Log => "Log",
            Self::Transmit => "Transmit",
            Self::LogAndTransmit => "Log and Transmit",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Transmit => "transmit",
            Self::LogAndTransmit => "log_and_transmit",
        }
    }
}

impl FromStr for LogTransmitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "log" => Ok(Self::Log),
            "transmit" => Ok(Self::Transmit),
            "log_and_transmit" | "log_transmit" => Ok(Self::LogAndTransmit),
            other => Err(format!("unknown log/transmit mode '{other}'")),
        }
    }
}

impl fmt::Display for LogTransmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sample representation on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Float,
    Calibrated,
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" => Ok(Self::Float),
            "calibrated" => Ok(Self::Calibrated),
            other => Err(format!("unknown data type '{other}'")),
        }
    }
}

/// Unit of a sampling duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl DurationUnit {
    pub fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3600,
        }
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    /// Matches by prefix: `s`, `sec`, `min`, `m`, `h`, `hours`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.starts_with('h') {
            Ok(Self::Hours)
        } else if s.starts_with('m') {
            Ok(Self::Minutes)
        } else if s.starts_with('s') {
            Ok(Self::Seconds)
        } else {
            Err(format!("unknown duration unit '{s}'"))
        }
    }
}

/// Body of `POST /api/sampling/start/{node}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingStartRequest {
    pub sample_rate: Option<i64>,
    pub log_transmit_mode: LogTransmitMode,
    pub data_type: DataType,
    pub continuous: bool,
    pub duration_value: u64,
    pub duration_units: DurationUnit,
}

/// A sampling run as the backend tracks it.
///
/// `run` is `{}` when the node has never sampled, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingRun {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub started_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub stopped_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub duration_sec: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub continuous: Option<bool>,
    #[serde(default)]
    pub mode_key: Option<String>,
    #[serde(default)]
    pub mode_label: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub sample_rate: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingStartAck {
    #[serde(default)]
    pub run: SamplingRun,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingStopAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub idle_status: Option<IdleStatus>,
    #[serde(default)]
    pub run: Option<SamplingRun>,
}

/// Body of `GET /api/sampling/status/{node}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingStatus {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub node_id: Option<i64>,
    #[serde(default)]
    pub node_state: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub node_state_num: Option<i64>,
    #[serde(default)]
    pub freshness_reason: Option<String>,
    #[serde(default)]
    pub link_state: Option<String>,
    #[serde(default)]
    pub run: SamplingRun,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub time_left_sec: Option<u64>,
}

// ── Base station ─────────────────────────────────────────────────────

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub port: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub beacon_state: Option<bool>,
    #[serde(default)]
    pub base_connection: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub ts: Option<String>,
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub base_fw: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub base_serial: Option<String>,
    #[serde(default)]
    pub base_region: Option<String>,
    #[serde(default)]
    pub base_radio: Option<String>,
    #[serde(default)]
    pub base_last_comm: Option<String>,
    #[serde(default)]
    pub base_link: Option<String>,
    #[serde(default)]
    pub link_health: Option<String>,
    #[serde(default)]
    pub link_health_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ping_age_sec: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub comm_age_sec: Option<f64>,
}

/// Body of `GET /api/logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogLines {
    #[serde(default)]
    pub logs: Vec<String>,
}
