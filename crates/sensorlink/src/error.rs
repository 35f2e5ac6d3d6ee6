//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into operator-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sensorlink_config::ConfigError;
use sensorlink_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PRECONDITION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach backend at {url}")]
    #[diagnostic(
        code(sensorlink::connection_failed),
        help(
            "Check that the sensorlink backend is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(sensorlink::timeout),
        help(
            "Increase the timeout with --timeout, or check that the base station is connected.\n\
             The node's operating state is now unknown; run: sensorlink node idle"
        )
    )]
    Timeout { seconds: u64 },

    // ── Preconditions (nothing was sent) ─────────────────────────────

    #[error("Node is not confirmed idle")]
    #[diagnostic(
        code(sensorlink::not_idle),
        help("Run: sensorlink node idle, then retry.")
    )]
    NotIdle,

    #[error("Sample rate is unknown")]
    #[diagnostic(
        code(sensorlink::unknown_sample_rate),
        help(
            "Pass --rate explicitly, or configure the node once in SensorConnect so it reports a rate."
        )
    )]
    UnknownSampleRate,

    #[error("{field} must be selected for the chosen transducer type")]
    #[diagnostic(
        code(sensorlink::missing_selection),
        help("Pass --sensor (and --wire for RTD transducers). Run: sensorlink node read to list options.")
    )]
    MissingSelection { field: String },

    #[error("'{value}' is not a legal {field} for this node")]
    #[diagnostic(
        code(sensorlink::invalid_option),
        help("Run: sensorlink node read to see the values this node accepts.")
    )]
    InvalidOption { field: String, value: String },

    #[error("{message}")]
    #[diagnostic(code(sensorlink::precondition))]
    Precondition { message: String },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("{operation} failed: {message}")]
    #[diagnostic(
        code(sensorlink::rejected),
        help(
            "The backend reported failure; the node's operating state may have changed.\n\
             Confirm idle again with: sensorlink node idle"
        )
    )]
    Rejected { operation: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sensorlink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sensorlink::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: sensorlink config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(sensorlink::no_config),
        help(
            "Create a config with: sensorlink config init\n\
             Or pass --backend / set SENSORLINK_BACKEND.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("No node selected")]
    #[diagnostic(
        code(sensorlink::no_node),
        help("Pass --node, set SENSORLINK_NODE, or add node_id to the profile.")
    )]
    NoNode,

    #[error(transparent)]
    #[diagnostic(code(sensorlink::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(sensorlink::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(sensorlink::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(sensorlink::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(sensorlink::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotIdle
            | Self::UnknownSampleRate
            | Self::MissingSelection { .. }
            | Self::InvalidOption { .. }
            | Self::Precondition { .. } => exit_code::PRECONDITION,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::NoConfig { .. }
            | Self::NoNode
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotIdle => CliError::NotIdle,
            CoreError::UnknownSampleRate => CliError::UnknownSampleRate,
            CoreError::MissingDependentSelection { field } => CliError::MissingSelection { field },
            CoreError::InvalidOption { field, value } => CliError::InvalidOption { field, value },

            err @ (CoreError::InvalidValue { .. }
            | CoreError::NoSnapshot { .. }
            | CoreError::Busy { .. }) => CliError::Precondition {
                message: err.to_string(),
            },

            CoreError::Rejected { operation, message } => CliError::Rejected { operation, message },

            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "backend".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
