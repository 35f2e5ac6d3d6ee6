// ── Domain model ──

pub mod channel;
pub mod field;
pub mod option;
pub mod snapshot;

pub use channel::{Channel, channel_label};
pub use field::{Field, FieldKind};
pub use option::{OptionItem, OptionValue};
pub use snapshot::{ConfigurationSnapshot, OptionField, PowerSetting, TimerSetting};
