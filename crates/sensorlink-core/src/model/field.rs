// ── Optional configuration fields ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Every optional field of a write request. The snake_case name is both
/// the write-payload key and the `supports_{name}` capability key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    InputRange,
    Unit,
    CjcUnit,
    LowPassFilter,
    StorageLimitMode,
    DataMode,
    DefaultMode,
    LostBeaconTimeout,
    DiagnosticInterval,
    InactivityTimeout,
    CheckRadioInterval,
    TransducerType,
    SensorType,
    WireType,
}

/// How a field's legal values are described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Chosen from an option list reported by the node.
    Enumerated,
    /// Non-negative integer (timeouts, intervals).
    Scalar,
    /// Member of the transducer → sensor → wire cascade.
    Dependent,
}

impl Field {
    pub fn kind(self) -> FieldKind {
        match self {
            Self::InputRange
            | Self::Unit
            | Self::CjcUnit
            | Self::LowPassFilter
            | Self::StorageLimitMode
            | Self::DataMode
            | Self::DefaultMode => FieldKind::Enumerated,
            Self::LostBeaconTimeout
            | Self::DiagnosticInterval
            | Self::InactivityTimeout
            | Self::CheckRadioInterval => FieldKind::Scalar,
            Self::TransducerType | Self::SensorType | Self::WireType => FieldKind::Dependent,
        }
    }

    /// Timers that carry a separate enable flag on write.
    pub fn has_enable_flag(self) -> bool {
        matches!(
            self,
            Self::LostBeaconTimeout | Self::DiagnosticInterval | Self::InactivityTimeout
        )
    }

    /// Human label for tables and messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::InputRange => "Input Range",
            Self::Unit => "Unit",
            Self::CjcUnit => "CJC Unit",
            Self::LowPassFilter => "Low Pass Filter",
            Self::StorageLimitMode => "Storage Limit Mode",
            Self::DataMode => "Data Mode",
            Self::DefaultMode => "Default Mode",
            Self::LostBeaconTimeout => "Lost Beacon Timeout",
            Self::DiagnosticInterval => "Diagnostic Interval",
            Self::InactivityTimeout => "Inactivity Timeout",
            Self::CheckRadioInterval => "Check Radio Interval",
            Self::TransducerType => "Transducer Type",
            Self::SensorType => "Sensor Type",
            Self::WireType => "Wire Type",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn names_are_payload_keys() {
        assert_eq!(Field::LowPassFilter.to_string(), "low_pass_filter");
        assert_eq!(Field::CjcUnit.as_ref(), "cjc_unit");
        assert_eq!("wire_type".parse::<Field>().unwrap(), Field::WireType);
        assert_eq!(Field::iter().count(), 14);
    }

    #[test]
    fn enable_flags_on_three_timers() {
        let flagged: Vec<Field> = Field::iter().filter(|f| f.has_enable_flag()).collect();
        assert_eq!(
            flagged,
            vec![
                Field::LostBeaconTimeout,
                Field::DiagnosticInterval,
                Field::InactivityTimeout
            ]
        );
    }
}
