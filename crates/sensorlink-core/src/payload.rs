// ── Write payload builder ──
//
// Turns an edited form into a minimal `WriteRequest`. Unsupported fields
// are omitted; supported fields left empty are sent as explicit `null`.

use sensorlink_api::models::WriteRequest;
use tracing::debug;

use crate::capability::CapabilityFlags;
use crate::cascade::TransducerKind;
use crate::error::CoreError;
use crate::form::NodeForm;
use crate::idle::IdleGate;
use crate::model::option::contains;
use crate::model::{ConfigurationSnapshot, Field, FieldKind, OptionItem, OptionValue};

pub struct WritePayloadBuilder<'a> {
    snapshot: &'a ConfigurationSnapshot,
    caps: &'a CapabilityFlags,
    gate: &'a IdleGate,
}

impl<'a> WritePayloadBuilder<'a> {
    pub fn new(
        snapshot: &'a ConfigurationSnapshot,
        caps: &'a CapabilityFlags,
        gate: &'a IdleGate,
    ) -> Self {
        Self {
            snapshot,
            caps,
            gate,
        }
    }

    /// Validate `form` and emit the request. The first failing check wins:
    /// idle gate, sample rate, dependent selection, then option membership.
    pub fn build(&self, form: &NodeForm) -> Result<WriteRequest, CoreError> {
        self.gate.require_confirmed()?;

        let rate_value = form.sample_rate().ok_or(CoreError::UnknownSampleRate)?;
        let sample_rate = rate_value.as_i64().ok_or(CoreError::UnknownSampleRate)?;

        self.check_dependent(form)?;

        let rates = &self.snapshot.sample_rate.options;
        if !rates.is_empty() && !contains(rates, rate_value) {
            return Err(invalid_option("sample_rate", rate_value));
        }

        let tx_power = form.tx_power().ok_or_else(|| CoreError::InvalidValue {
            field: "tx_power".into(),
            value: "empty".into(),
        })?;
        let powers = &self.snapshot.tx_power.options;
        if !powers.is_empty() && !powers.contains(&tx_power) {
            return Err(CoreError::InvalidOption {
                field: "tx_power".into(),
                value: tx_power.to_string(),
            });
        }

        let mut request = WriteRequest {
            node_id: form.node_id(),
            sample_rate,
            tx_power,
            channels: form.enabled_channels(),
            ..WriteRequest::default()
        };

        for field in self.caps.supported_fields() {
            let value = self.field_value(form, field)?;
            *slot(&mut request, field) = Some(value);
            if field.has_enable_flag() {
                *enable_slot(&mut request, field) = form.timer_enabled(field);
            }
        }

        debug!(
            node_id = request.node_id,
            fields = self.caps.supported_fields().count(),
            "write payload built"
        );
        Ok(request)
    }

    fn check_dependent(&self, form: &NodeForm) -> Result<(), CoreError> {
        if !self.caps.supports(Field::TransducerType) {
            return Ok(());
        }
        let selection = form.selection();
        if selection.transducer.is_none() {
            return Ok(());
        }
        if self.caps.supports(Field::SensorType) && selection.sensor.is_none() {
            return Err(CoreError::MissingDependentSelection {
                field: Field::SensorType.to_string(),
            });
        }
        let is_rtd = selection.kind(form.cascade()) == Some(TransducerKind::Rtd);
        if is_rtd && self.caps.supports(Field::WireType) && selection.wire.is_none() {
            return Err(CoreError::MissingDependentSelection {
                field: Field::WireType.to_string(),
            });
        }
        Ok(())
    }

    /// Parsed value of a supported field; `None` is the explicit clear.
    fn field_value(&self, form: &NodeForm, field: Field) -> Result<Option<i64>, CoreError> {
        let Some(value) = form.value(field) else {
            return Ok(None);
        };
        match field.kind() {
            FieldKind::Enumerated => {
                let options = self
                    .snapshot
                    .option_field(field)
                    .map_or(&[][..], |f| f.options.as_slice());
                enumerated(field, value, options)
            }
            FieldKind::Dependent => {
                let domain = match field {
                    Field::TransducerType => &form.cascade().transducers[..],
                    Field::SensorType => form.sensor_domain(),
                    _ => form.wire_domain(),
                };
                enumerated(field, value, domain)
            }
            FieldKind::Scalar => match value.as_i64() {
                Some(v) if v >= 0 => Ok(Some(v)),
                _ => Err(CoreError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                }),
            },
        }
    }
}

fn enumerated(
    field: Field,
    value: &OptionValue,
    options: &[OptionItem],
) -> Result<Option<i64>, CoreError> {
    if !options.is_empty() && !contains(options, value) {
        return Err(invalid_option(field.as_ref(), value));
    }
    value
        .as_i64()
        .map(Some)
        .ok_or_else(|| CoreError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn invalid_option(field: &str, value: &OptionValue) -> CoreError {
    CoreError::InvalidOption {
        field: field.to_owned(),
        value: value.to_string(),
    }
}

fn slot(request: &mut WriteRequest, field: Field) -> &mut Option<Option<i64>> {
    match field {
        Field::InputRange => &mut request.input_range,
        Field::Unit => &mut request.unit,
        Field::CjcUnit => &mut request.cjc_unit,
        Field::LowPassFilter => &mut request.low_pass_filter,
        Field::StorageLimitMode => &mut request.storage_limit_mode,
        Field::DataMode => &mut request.data_mode,
        Field::DefaultMode => &mut request.default_mode,
        Field::LostBeaconTimeout => &mut request.lost_beacon_timeout,
        Field::DiagnosticInterval => &mut request.diagnostic_interval,
        Field::InactivityTimeout => &mut request.inactivity_timeout,
        Field::CheckRadioInterval => &mut request.check_radio_interval,
        Field::TransducerType => &mut request.transducer_type,
        Field::SensorType => &mut request.sensor_type,
        Field::WireType => &mut request.wire_type,
    }
}

fn enable_slot(request: &mut WriteRequest, field: Field) -> &mut Option<bool> {
    match field {
        Field::LostBeaconTimeout => &mut request.lost_beacon_enabled,
        Field::DiagnosticInterval => &mut request.diagnostic_enabled,
        _ => &mut request.inactivity_enabled,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::convert::snapshot_from_config;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use sensorlink_api::models::NodeConfig;
    use serde_json::{Value, json};
    use strum::IntoEnumIterator;

    fn snapshot(value: Value) -> ConfigurationSnapshot {
        let cfg: NodeConfig = serde_json::from_value(value).unwrap();
        snapshot_from_config(7, cfg, Utc::now())
    }

    fn confirmed() -> IdleGate {
        let mut gate = IdleGate::new();
        gate.observe_read(Some(0));
        gate
    }

    fn minimal() -> ConfigurationSnapshot {
        snapshot(json!({
            "state": 0,
            "current_rate": 1,
            "supported_rates": [{"enum_val": 1, "str_val": "1Hz"}],
            "current_power": 10,
            "channels": [{"id": 1, "enabled": true}],
        }))
    }

    /// A node that reports every optional field with legal values.
    fn full() -> ConfigurationSnapshot {
        snapshot(json!({
            "state": 0,
            "model": "TC-Link-200",
            "current_rate": 1,
            "supported_rates": [{"enum_val": 1, "str_val": "1Hz"}, {"enum_val": 2, "str_val": "2Hz"}],
            "current_power": 10,
            "channels": [{"id": 1, "enabled": true}, {"id": 2, "enabled": true}],
            "current_input_range": 3,
            "supported_input_ranges": [{"value": 3, "label": "+-1.35V"}],
            "current_unit": 1,
            "unit_options": [{"value": 1, "label": "Celsius"}],
            "current_cjc_unit": 1,
            "cjc_unit_options": [{"value": 1, "label": "Celsius"}],
            "current_low_pass": 294,
            "low_pass_options": [{"value": 294, "label": "294 Hz"}],
            "current_storage_limit_mode": 0,
            "storage_limit_options": [{"value": 0, "label": "Overwrite"}],
            "current_data_mode": 1,
            "data_mode_options": [{"value": 1, "label": "Transmit"}],
            "supports_default_mode": true,
            "current_default_mode": 0,
            "default_mode_options": [{"value": 0, "label": "Idle"}],
            "current_lost_beacon_timeout": 2,
            "current_diagnostic_interval": 60,
            "current_inactivity_timeout": 30,
            "current_check_radio_interval": 5,
            "supports_transducer_type": true,
            "transducer_options": [{"value": 0, "label": "Thermocouple"}, {"value": 1, "label": "RTD"}],
            "thermocouple_sensor_options": [{"value": 1, "label": "Type K"}],
            "rtd_sensor_options": [{"value": 10, "label": "PT100"}],
            "current_transducer_type": 1,
            "current_sensor_type": 10,
            "current_wire_type": 2,
        }))
    }

    #[test]
    fn minimal_payload_has_only_required_keys() {
        let snap = minimal();
        let caps = CapabilityFlags::derive(&snap);
        let gate = confirmed();
        let form = NodeForm::from_snapshot(&snap);
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"node_id": 7, "sample_rate": 1, "tx_power": 10, "channels": [1]})
        );
    }

    #[test]
    fn not_idle_wins_over_everything() {
        let snap = snapshot(json!({"current_rate": null}));
        let caps = CapabilityFlags::derive(&snap);
        let form = NodeForm::from_snapshot(&snap);
        let err = WritePayloadBuilder::new(&snap, &caps, &IdleGate::new())
            .build(&form)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotIdle));
    }

    #[test]
    fn absent_rate_rejected_even_when_rest_is_valid() {
        let snap = full();
        let caps = CapabilityFlags::derive(&snap);
        let gate = confirmed();
        let mut form = NodeForm::from_snapshot(&snap);
        form.set_sample_rate(None);
        let err = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownSampleRate));

        form.set_sample_rate(Some(OptionValue::from("N/A")));
        let err = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownSampleRate));
    }

    #[test]
    fn dependent_selection_required() {
        let snap = full();
        let caps = CapabilityFlags::derive(&snap);
        let gate = confirmed();

        let mut form = NodeForm::from_snapshot(&snap);
        form.set_value(Field::SensorType, None);
        let err = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap_err();
        assert!(
            matches!(err, CoreError::MissingDependentSelection { ref field } if field == "sensor_type")
        );

        let mut form = NodeForm::from_snapshot(&snap);
        form.set_value(Field::WireType, None);
        let err = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap_err();
        assert!(
            matches!(err, CoreError::MissingDependentSelection { ref field } if field == "wire_type")
        );

        // Thermocouple needs no wire.
        let mut form = NodeForm::from_snapshot(&snap);
        form.set_value(Field::TransducerType, Some(OptionValue::from(0_i64)));
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        assert_eq!(req.transducer_type, Some(Some(0)));
        assert_eq!(req.sensor_type, Some(Some(1)));
        assert_eq!(req.wire_type, Some(None));
    }

    #[test]
    fn cleared_supported_field_is_null() {
        let snap = full();
        let caps = CapabilityFlags::derive(&snap);
        let gate = confirmed();
        let mut form = NodeForm::from_snapshot(&snap);
        form.set_value(Field::LowPassFilter, None);
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["low_pass_filter"], Value::Null);
        assert!(body.as_object().unwrap().contains_key("low_pass_filter"));
    }

    #[test]
    fn illegal_options_rejected() {
        let snap = full();
        let caps = CapabilityFlags::derive(&snap);
        let gate = confirmed();

        let mut form = NodeForm::from_snapshot(&snap);
        form.set_tx_power(16);
        assert!(matches!(
            WritePayloadBuilder::new(&snap, &caps, &gate).build(&form),
            Err(CoreError::InvalidOption { ref field, .. }) if field == "tx_power"
        ));

        let mut form = NodeForm::from_snapshot(&snap);
        form.set_value(Field::Unit, Some(OptionValue::from(9_i64)));
        assert!(matches!(
            WritePayloadBuilder::new(&snap, &caps, &gate).build(&form),
            Err(CoreError::InvalidOption { ref field, .. }) if field == "unit"
        ));

        let mut form = NodeForm::from_snapshot(&snap);
        form.set_value(Field::InactivityTimeout, Some(OptionValue::from(-5)));
        assert!(matches!(
            WritePayloadBuilder::new(&snap, &caps, &gate).build(&form),
            Err(CoreError::InvalidValue { ref field, .. }) if field == "inactivity_timeout"
        ));

        let mut form = NodeForm::from_snapshot(&snap);
        form.set_sample_rate(Some(OptionValue::from(9_i64)));
        assert!(matches!(
            WritePayloadBuilder::new(&snap, &caps, &gate).build(&form),
            Err(CoreError::InvalidOption { ref field, .. }) if field == "sample_rate"
        ));
    }

    #[test]
    fn timer_flags_follow_form_and_support() {
        let snap = full();
        let gate = confirmed();
        let mut caps = CapabilityFlags::derive(&snap);
        let mut form = NodeForm::from_snapshot(&snap);

        // Nothing reported, nothing set: the backend derives the flags.
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        let body = serde_json::to_value(&req).unwrap();
        for key in ["lost_beacon_enabled", "diagnostic_enabled", "inactivity_enabled"] {
            assert!(!body.as_object().unwrap().contains_key(key), "{key}");
        }

        form.set_timer_enabled(Field::LostBeaconTimeout, false).unwrap();
        form.set_timer_enabled(Field::InactivityTimeout, true).unwrap();
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        assert_eq!(req.lost_beacon_enabled, Some(false));
        assert_eq!(req.inactivity_enabled, Some(true));
        assert_eq!(req.diagnostic_enabled, None);

        // An unsupported timer drops its flag along with its value.
        caps.set(Field::InactivityTimeout, false);
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        assert_eq!(req.inactivity_timeout, None);
        assert_eq!(req.inactivity_enabled, None);
        assert_eq!(req.lost_beacon_enabled, Some(false));
    }

    #[test]
    fn reported_timer_flag_is_written_back() {
        let snap = snapshot(json!({
            "state": 0,
            "current_rate": 1,
            "supported_rates": [{"enum_val": 1, "str_val": "1Hz"}],
            "current_power": 10,
            "channels": [{"id": 1, "enabled": true}],
            "current_diagnostic_interval": 60,
            "current_diagnostic_enabled": "false",
        }));
        let caps = CapabilityFlags::derive(&snap);
        let gate = confirmed();
        let form = NodeForm::from_snapshot(&snap);
        let req = WritePayloadBuilder::new(&snap, &caps, &gate)
            .build(&form)
            .unwrap();
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "node_id": 7,
                "sample_rate": 1,
                "tx_power": 10,
                "channels": [1],
                "diagnostic_interval": 60,
                "diagnostic_enabled": false,
            })
        );
    }

    #[test]
    fn unsupported_fields_never_included() {
        let snap = full();
        let gate = confirmed();
        let form = NodeForm::from_snapshot(&snap);
        let fields: Vec<Field> = Field::iter().collect();

        for mask in 0u32..(1 << fields.len()) {
            let mut caps = CapabilityFlags::uniform(false);
            for (bit, field) in fields.iter().enumerate() {
                caps.set(*field, mask & (1 << bit) != 0);
            }
            let req = WritePayloadBuilder::new(&snap, &caps, &gate)
                .build(&form)
                .unwrap();
            let body = serde_json::to_value(&req).unwrap();
            let body = body.as_object().unwrap();
            for field in &fields {
                assert_eq!(
                    body.contains_key(field.as_ref()),
                    caps.supports(*field),
                    "mask {mask:#b}, field {field}"
                );
            }
        }
    }
}
