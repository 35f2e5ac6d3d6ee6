// ── Dependent option cascade ──
//
// Transducer type → sensor type → wire type. The sensor domain is chosen
// solely by the transducer kind; the wire domain is non-empty only for RTD.

use serde::Serialize;
use tracing::trace;

use crate::model::option::{OptionItem, OptionValue, contains};

/// Physical transducer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum TransducerKind {
    Thermocouple,
    #[strum(serialize = "RTD")]
    Rtd,
    Thermistor,
}

impl TransducerKind {
    /// Resolve the kind of a transducer option: by label first, then by
    /// the conventional ids (0 thermocouple, 1 RTD, 2 thermistor).
    pub fn of(option: &OptionItem) -> Option<Self> {
        let label = option.label.to_ascii_lowercase();
        if label.contains("thermocouple") {
            return Some(Self::Thermocouple);
        }
        if label.contains("thermistor") {
            return Some(Self::Thermistor);
        }
        if label.contains("rtd") {
            return Some(Self::Rtd);
        }
        Self::from_code(&option.value)
    }

    fn from_code(value: &OptionValue) -> Option<Self> {
        match value.as_i64()? {
            0 => Some(Self::Thermocouple),
            1 => Some(Self::Rtd),
            2 => Some(Self::Thermistor),
            _ => None,
        }
    }
}

/// Option tables of the cascade, as reported by one read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeTable {
    pub transducers: Vec<OptionItem>,
    pub thermocouple_sensors: Vec<OptionItem>,
    pub rtd_sensors: Vec<OptionItem>,
    pub thermistor_sensors: Vec<OptionItem>,
    pub rtd_wires: Vec<OptionItem>,
}

impl CascadeTable {
    /// RTD wiring when the backend does not list it.
    pub fn default_rtd_wires() -> Vec<OptionItem> {
        vec![
            OptionItem::new(0_i64, "2 Wire"),
            OptionItem::new(1_i64, "3 Wire"),
            OptionItem::new(2_i64, "4 Wire"),
        ]
    }

    /// Kind of the given transducer value. Values outside the transducer
    /// table still resolve by code, so a stale selection keeps its domain.
    pub fn kind_of(&self, transducer: &OptionValue) -> Option<TransducerKind> {
        self.transducers
            .iter()
            .find(|o| &o.value == transducer)
            .map_or_else(|| TransducerKind::from_code(transducer), TransducerKind::of)
    }

    pub fn sensor_domain(&self, transducer: Option<&OptionValue>) -> &[OptionItem] {
        match transducer.and_then(|t| self.kind_of(t)) {
            Some(TransducerKind::Thermocouple) => &self.thermocouple_sensors,
            Some(TransducerKind::Rtd) => &self.rtd_sensors,
            Some(TransducerKind::Thermistor) => &self.thermistor_sensors,
            None => &[],
        }
    }

    pub fn wire_domain(&self, transducer: Option<&OptionValue>) -> &[OptionItem] {
        match transducer.and_then(|t| self.kind_of(t)) {
            Some(TransducerKind::Rtd) => &self.rtd_wires,
            _ => &[],
        }
    }

    /// `true` if any transducer kind has a sensor table.
    pub fn has_sensor_options(&self) -> bool {
        !(self.thermocouple_sensors.is_empty()
            && self.rtd_sensors.is_empty()
            && self.thermistor_sensors.is_empty())
    }
}

/// The (transducer, sensor, wire) triple. `None` is the empty sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependentSelection {
    pub transducer: Option<OptionValue>,
    pub sensor: Option<OptionValue>,
    pub wire: Option<OptionValue>,
}

impl DependentSelection {
    /// First computation after a read: the reported values are treated as
    /// the previous selection, so the preservation rule applies.
    pub fn seed(
        table: &CascadeTable,
        transducer: Option<OptionValue>,
        sensor: Option<OptionValue>,
        wire: Option<OptionValue>,
    ) -> Self {
        let mut selection = Self {
            transducer: None,
            sensor,
            wire,
        };
        selection.set_transducer(table, transducer);
        selection
    }

    /// Recompute the dependent domains for a new transducer, keeping the
    /// prior sensor/wire when still legal.
    pub fn set_transducer(&mut self, table: &CascadeTable, transducer: Option<OptionValue>) {
        let sensor = preserve(self.sensor.take(), table.sensor_domain(transducer.as_ref()));
        let wire = preserve(self.wire.take(), table.wire_domain(transducer.as_ref()));
        trace!(?transducer, ?sensor, ?wire, "cascade recomputed");
        self.transducer = transducer;
        self.sensor = sensor;
        self.wire = wire;
    }

    pub fn kind(&self, table: &CascadeTable) -> Option<TransducerKind> {
        self.transducer.as_ref().and_then(|t| table.kind_of(t))
    }
}

/// Keep `previous` if it is in `domain`, else the first entry, else empty.
pub fn preserve(previous: Option<OptionValue>, domain: &[OptionItem]) -> Option<OptionValue> {
    match previous {
        Some(prev) if contains(domain, &prev) => Some(prev),
        _ => domain.first().map(|o| o.value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> CascadeTable {
        CascadeTable {
            transducers: vec![
                OptionItem::new(0_i64, "Thermocouple"),
                OptionItem::new(1_i64, "RTD"),
                OptionItem::new(2_i64, "Thermistor"),
            ],
            thermocouple_sensors: vec![
                OptionItem::new(1_i64, "Type K"),
                OptionItem::new(2_i64, "Type J"),
            ],
            rtd_sensors: vec![OptionItem::new(10_i64, "PT100"), OptionItem::new(11_i64, "PT1000")],
            thermistor_sensors: vec![OptionItem::new(20_i64, "44004/44033")],
            rtd_wires: CascadeTable::default_rtd_wires(),
        }
    }

    fn v(n: i64) -> Option<OptionValue> {
        Some(OptionValue::from(n))
    }

    #[test]
    fn rtd_always_has_wire_domain() {
        let t = table();
        let mut sel = DependentSelection::default();
        sel.set_transducer(&t, v(1));
        assert!(!t.wire_domain(sel.transducer.as_ref()).is_empty());
        assert_eq!(sel.wire, v(0));
        assert_eq!(sel.sensor, v(10));
    }

    #[test]
    fn non_rtd_clears_wire() {
        let t = table();
        let mut sel = DependentSelection::seed(&t, v(1), v(11), v(2));
        assert_eq!(sel.wire, v(2));

        sel.set_transducer(&t, v(0));
        assert!(t.wire_domain(sel.transducer.as_ref()).is_empty());
        assert_eq!(sel.wire, None);

        sel.set_transducer(&t, v(2));
        assert_eq!(sel.wire, None);
    }

    #[test]
    fn sensor_preserved_only_when_still_legal() {
        let mut t = table();
        // PT100 also valid for thermistors on this hypothetical node.
        t.thermistor_sensors.push(OptionItem::new(10_i64, "PT100"));

        let mut sel = DependentSelection::seed(&t, v(1), v(10), None);
        sel.set_transducer(&t, v(2));
        assert_eq!(sel.sensor, v(10));

        sel.set_transducer(&t, v(0));
        assert_eq!(sel.sensor, v(1), "falls back to first entry");
    }

    #[test]
    fn empty_transducer_empties_everything() {
        let t = table();
        let mut sel = DependentSelection::seed(&t, v(1), v(10), v(1));
        sel.set_transducer(&t, None);
        assert_eq!(sel, DependentSelection::default());
    }

    #[test]
    fn seed_applies_preservation_rule() {
        let t = table();
        // Reported sensor 99 is not in the RTD table.
        let sel = DependentSelection::seed(&t, v(1), v(99), v(7));
        assert_eq!(sel.sensor, v(10));
        assert_eq!(sel.wire, v(0));
    }

    #[test]
    fn kind_resolves_by_label_then_code() {
        let t = CascadeTable {
            transducers: vec![OptionItem::new(5_i64, "rtd (3-wire capable)")],
            ..CascadeTable::default()
        };
        assert_eq!(t.kind_of(&OptionValue::from(5_i64)), Some(TransducerKind::Rtd));
        assert_eq!(t.kind_of(&OptionValue::from(2_i64)), Some(TransducerKind::Thermistor));
        assert_eq!(t.kind_of(&OptionValue::from(9_i64)), None);
    }
}
