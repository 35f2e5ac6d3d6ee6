// ── Enumerated option values ──

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical string form of an option value.
///
/// The backend mixes `3`, `"3"` and `3.0` for the same choice, so equality
/// is defined on the canonical string rather than the raw JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValue(String);

impl OptionValue {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_owned())
    }

    /// Canonicalize a raw JSON value. `null` and blank strings are the
    /// empty sentinel and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => {
                let v = Self::new(s);
                (!v.is_placeholder()).then_some(v)
            }
            Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self(i.to_string()),
                (None, Some(f)) if f.fract() == 0.0 => Self(format!("{f:.0}")),
                _ => Self(n.to_string()),
            }),
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer form, tolerating integral floats such as `"3.0"`.
    pub fn as_i64(&self) -> Option<i64> {
        if let Ok(v) = self.0.parse::<i64>() {
            return Some(v);
        }
        let f = self.0.parse::<f64>().ok()?;
        if f.fract() == 0.0 {
            format!("{f:.0}").parse().ok()
        } else {
            None
        }
    }

    /// Blank or `N/A`: a disabled placeholder, not a legal choice.
    pub fn is_placeholder(&self) -> bool {
        self.0.is_empty() || self.0.eq_ignore_ascii_case("n/a")
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

/// One legal choice for an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub value: OptionValue,
    pub label: String,
    #[serde(default)]
    pub primary: bool,
}

impl OptionItem {
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            primary: false,
        }
    }
}

/// `true` if `value` is one of `options` (canonical-string equality).
pub fn contains(options: &[OptionItem], value: &OptionValue) -> bool {
    options.iter().any(|o| &o.value == value)
}

/// Label of the option matching `value`, if any.
pub fn label_of<'a>(options: &'a [OptionItem], value: &OptionValue) -> Option<&'a str> {
    options
        .iter()
        .find(|o| &o.value == value)
        .map(|o| o.label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_forms_compare_equal() {
        assert_eq!(OptionValue::from_json(&json!(3)), OptionValue::from_json(&json!("3")));
        assert_eq!(OptionValue::from_json(&json!(3.0)), Some(OptionValue::from(3_i64)));
        assert_eq!(OptionValue::from_json(&json!(" 7 ")), Some(OptionValue::from(7_i64)));
    }

    #[test]
    fn sentinels_are_empty() {
        assert_eq!(OptionValue::from_json(&json!(null)), None);
        assert_eq!(OptionValue::from_json(&json!("")), None);
        assert_eq!(OptionValue::from_json(&json!("N/A")), None);
    }

    #[test]
    fn integer_view() {
        assert_eq!(OptionValue::new("294").as_i64(), Some(294));
        assert_eq!(OptionValue::new("2.0").as_i64(), Some(2));
        assert_eq!(OptionValue::new("2.5").as_i64(), None);
        assert_eq!(OptionValue::new("fast").as_i64(), None);
    }

    #[test]
    fn membership_and_labels() {
        let opts = vec![OptionItem::new(0_i64, "Overwrite"), OptionItem::new(1_i64, "Stop")];
        assert!(contains(&opts, &OptionValue::new("1")));
        assert!(!contains(&opts, &OptionValue::new("2")));
        assert_eq!(label_of(&opts, &OptionValue::from(0_i64)), Some("Overwrite"));
    }
}
