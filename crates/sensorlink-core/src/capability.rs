// ── Capability model ──
//
// One explicit record of which optional fields a node supports, computed
// once per snapshot. Drives both visibility and write-payload inclusion.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::model::{ConfigurationSnapshot, Field, FieldKind};

/// Support flag per optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityFlags {
    flags: BTreeMap<Field, bool>,
}

impl CapabilityFlags {
    /// Derive flags from a snapshot.
    ///
    /// - Enumerated fields: declared flag (default `true`; default `false`
    ///   for default mode) AND a non-empty legal option list.
    /// - Timers: declared flag, or else whether the node reported a value.
    /// - Transducer/sensor/wire: one group. Requires an explicit
    ///   `supports_transducer_type` and a non-empty transducer table;
    ///   sensor and wire additionally honor their own declared flag.
    pub fn derive(snapshot: &ConfigurationSnapshot) -> Self {
        let flags = Field::iter()
            .map(|field| (field, supported(snapshot, field)))
            .collect();
        Self { flags }
    }

    /// All fields forced to a value (used by tests and dry runs).
    pub fn uniform(value: bool) -> Self {
        Self {
            flags: Field::iter().map(|f| (f, value)).collect(),
        }
    }

    pub fn supports(&self, field: Field) -> bool {
        self.flags.get(&field).copied().unwrap_or(false)
    }

    /// Visible/enabled in an editor iff supported.
    pub fn is_visible(&self, field: Field) -> bool {
        self.supports(field)
    }

    pub fn supported_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(field, _)| *field)
    }

    pub fn set(&mut self, field: Field, supported: bool) {
        self.flags.insert(field, supported);
    }
}

fn supported(snapshot: &ConfigurationSnapshot, field: Field) -> bool {
    let declared = snapshot.declared(field);
    match field.kind() {
        FieldKind::Enumerated => {
            let default = field != Field::DefaultMode;
            let has_options = snapshot
                .option_field(field)
                .is_some_and(|f| !f.options.is_empty());
            declared.unwrap_or(default) && has_options
        }
        FieldKind::Scalar => declared.unwrap_or_else(|| snapshot.current(field).is_some()),
        FieldKind::Dependent => {
            let group = snapshot.declared(Field::TransducerType).unwrap_or(false)
                && !snapshot.cascade.transducers.is_empty();
            match field {
                Field::TransducerType => group,
                _ => group && declared.unwrap_or(true),
            }
        }
    }
}
