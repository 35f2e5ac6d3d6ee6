// sensorlink-core: Capability-driven configuration sync between sensorlink-api and the console.

pub mod capability;
pub mod cascade;
pub mod config;
pub mod convert;
pub mod error;
pub mod form;
pub mod idle;
pub mod model;
pub mod payload;
pub mod power;
pub mod sampling;
pub mod session;
pub mod staleness;
pub mod summary;

// ── Primary re-exports ──────────────────────────────────────────────
pub use capability::CapabilityFlags;
pub use cascade::{CascadeTable, DependentSelection, TransducerKind};
pub use config::{ConsoleConfig, TlsVerification};
pub use error::CoreError;
pub use form::NodeForm;
pub use idle::{IdleGate, IdleState, StateChangingCommand};
pub use payload::WritePayloadBuilder;
pub use sampling::{
    RunPhase, SamplingDuration, SamplingParams, SamplingRunController, SamplingRunState,
};
pub use session::{Action, NodeSession, WriteReceipt};
pub use staleness::{BaseLinkView, LinkHealth, Severity};
pub use summary::SummaryPart;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Channel, ConfigurationSnapshot, Field, FieldKind, OptionField, OptionItem, OptionValue,
    PowerSetting, TimerSetting, channel_label,
};

// Wire types callers build requests from or render replies of.
pub use sensorlink_api::models::{
    BaseStatus, CommandAck, DataType, DiagnosticFlag, Diagnostics, DurationUnit, IdleAck,
    IdleStatus, LogLines, LogTransmitMode, WriteRequest,
};
