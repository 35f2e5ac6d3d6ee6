// ── Core error types ──
//
// Operator-facing errors from sensorlink-core. Three families:
// precondition failures detected locally (never sent to the backend, never
// touch the idle gate), backend rejections (`success: false`, text kept
// verbatim), and transport failures. The `From<sensorlink_api::Error>` impl
// translates transport-layer errors into the latter two.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Precondition failures ────────────────────────────────────────
    #[error("Node is not confirmed in Idle. Run Set to Idle first.")]
    NotIdle,

    #[error("Sample Rate is unknown (N/A). Run a full read once or configure the node in SensorConnect.")]
    UnknownSampleRate,

    #[error("{field} must be selected for the chosen transducer type")]
    MissingDependentSelection { field: String },

    #[error("'{value}' is not a legal {field} for this node")]
    InvalidOption { field: String, value: String },

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("No configuration has been read for node {node_id} yet")]
    NoSnapshot { node_id: u32 },

    #[error("{action} is already in progress")]
    Busy { action: String },

    // ── Backend failures ─────────────────────────────────────────────
    #[error("{operation} failed: {message}")]
    Rejected { operation: String, message: String },

    // ── Transport failures ───────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Local validation failures. These never reach the backend and never
    /// change the idle gate.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotIdle
                | Self::UnknownSampleRate
                | Self::MissingDependentSelection { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidValue { .. }
                | Self::NoSnapshot { .. }
                | Self::Busy { .. }
        )
    }

    /// Attach the operation name to a backend rejection.
    pub(crate) fn during(self, operation: &str) -> Self {
        match self {
            Self::Rejected { message, .. } => Self::Rejected {
                operation: operation.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sensorlink_api::Error> for CoreError {
    fn from(err: sensorlink_api::Error) -> Self {
        match err {
            sensorlink_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            sensorlink_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sensorlink_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            sensorlink_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            sensorlink_api::Error::Http { status, body } => CoreError::Rejected {
                operation: "request".into(),
                message: if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
            },
            sensorlink_api::Error::Backend { message } => CoreError::Rejected {
                operation: "request".into(),
                message,
            },
            sensorlink_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected backend response: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preconditions_are_local() {
        assert!(CoreError::NotIdle.is_precondition());
        assert!(CoreError::UnknownSampleRate.is_precondition());
        assert!(
            CoreError::MissingDependentSelection {
                field: "sensor_type".into()
            }
            .is_precondition()
        );
        assert!(
            !CoreError::Rejected {
                operation: "write".into(),
                message: "nope".into()
            }
            .is_precondition()
        );
        assert!(!CoreError::Timeout { timeout_secs: 30 }.is_precondition());
    }

    #[test]
    fn backend_text_survives_conversion() {
        let err: CoreError = sensorlink_api::Error::Backend {
            message: "Base station not connected: port busy".into(),
        }
        .into();
        let err = err.during("probe");
        assert_eq!(
            err.to_string(),
            "probe failed: Base station not connected: port busy"
        );
    }

    #[test]
    fn api_timeout_keeps_duration() {
        let err: CoreError = sensorlink_api::Error::Timeout { timeout_secs: 12 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 12 }));
    }
}
